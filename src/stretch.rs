//! Desk stretches suggested at the start of a break.

use rand::seq::SliceRandom;
use rand::Rng;

pub const DESK_STRETCHES: [&str; 5] = [
    "Sit tall with both feet flat. Lace your fingers, turn the palms to the \
     ceiling and reach up. Hold 10-15 seconds, then let go.",
    "Sit on the front of the seat and rest your right ankle on your left knee. \
     Press the right knee down gently and lean forward into the hip. Hold \
     10-15 seconds, then change sides.",
    "Sit tall, put your left hand on the chair back and turn your torso left, \
     looking over the left shoulder. Hold 10-15 seconds, then change sides.",
    "Bring your right arm across your chest and draw it in with the left hand. \
     Hold 10-15 seconds, then change sides.",
    "Sit tall and tip your right ear toward your right shoulder until the left \
     side of the neck stretches. Hold 10-15 seconds, then change sides.",
];

pub fn desk_stretch<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    DESK_STRETCHES.choose(rng).copied().unwrap_or(DESK_STRETCHES[0])
}
