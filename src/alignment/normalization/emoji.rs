//! DeepMoji emoji distribution folding.
//!
//! DeepMoji predicts a probability for each of 64 emoji ids (0-63). Every id
//! is assigned one coarse emotion name; those names then go through the
//! regular synonym table.

pub(crate) const EMOJI_COUNT: usize = 64;

const EMOJI_EMOTION_NAMES: [&str; 7] = [
    "frustration",
    "anger",
    "excited",
    "happy",
    "neutral",
    "disgust",
    "joy",
];

#[rustfmt::skip]
const EMOJI_TO_EMOTION: [u8; EMOJI_COUNT] = [
    2, 0, 0, 0, 6, 0, 2, 6, 6, 2,
    3, 4, 4, 2, 4, 3, 6, 6, 6, 0,
    3, 2, 4, 4, 6, 4, 4, 0, 3, 5,
    3, 3, 1, 2, 4, 4, 3, 1, 4, 4,
    2, 2, 4, 4, 2, 4, 4, 3, 3, 3,
    3, 2, 0, 6, 2, 1, 3, 4, 2, 3,
    3, 3, 4, 4,
];

pub(crate) fn emotion_name(emoji_id: usize) -> Option<&'static str> {
    EMOJI_TO_EMOTION
        .get(emoji_id)
        .map(|&idx| EMOJI_EMOTION_NAMES[idx as usize])
}
