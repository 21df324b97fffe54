fn main() -> anyhow::Result<()> {
    pomotimer_lib::run()
}
