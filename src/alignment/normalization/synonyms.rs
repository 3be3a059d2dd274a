use crate::taxonomy::EmotionLabel;

/// Source-label synonyms, keyed by `label_key` form. Includes the short codes
/// emitted by IEMOCAP-trained speech emotion models.
pub(super) const SYNONYMS: &[(&str, EmotionLabel)] = &[
    ("joy", EmotionLabel::Joy),
    ("joyful", EmotionLabel::Joy),
    ("happy", EmotionLabel::Joy),
    ("happiness", EmotionLabel::Joy),
    ("hap", EmotionLabel::Joy),
    ("excited", EmotionLabel::Joy),
    ("excitement", EmotionLabel::Joy),
    ("exc", EmotionLabel::Joy),
    ("amusement", EmotionLabel::Joy),
    ("love", EmotionLabel::Joy),
    ("optimism", EmotionLabel::Joy),
    ("pride", EmotionLabel::Joy),
    ("gratitude", EmotionLabel::Joy),
    ("delight", EmotionLabel::Joy),
    ("enthusiasm", EmotionLabel::Joy),
    ("positive", EmotionLabel::Joy),
    ("anger", EmotionLabel::Anger),
    ("angry", EmotionLabel::Anger),
    ("ang", EmotionLabel::Anger),
    ("frustration", EmotionLabel::Anger),
    ("frustrated", EmotionLabel::Anger),
    ("fru", EmotionLabel::Anger),
    ("annoyance", EmotionLabel::Anger),
    ("annoyed", EmotionLabel::Anger),
    ("irritation", EmotionLabel::Anger),
    ("rage", EmotionLabel::Anger),
    ("hostility", EmotionLabel::Anger),
    ("sadness", EmotionLabel::Sadness),
    ("sad", EmotionLabel::Sadness),
    ("grief", EmotionLabel::Sadness),
    ("sorrow", EmotionLabel::Sadness),
    ("disappointment", EmotionLabel::Sadness),
    ("remorse", EmotionLabel::Sadness),
    ("unhappy", EmotionLabel::Sadness),
    ("fear", EmotionLabel::Fear),
    ("fearful", EmotionLabel::Fear),
    ("fea", EmotionLabel::Fear),
    ("afraid", EmotionLabel::Fear),
    ("scared", EmotionLabel::Fear),
    ("anxiety", EmotionLabel::Fear),
    ("anxious", EmotionLabel::Fear),
    ("nervousness", EmotionLabel::Fear),
    ("nervous", EmotionLabel::Fear),
    ("disgust", EmotionLabel::Disgust),
    ("disgusted", EmotionLabel::Disgust),
    ("dis", EmotionLabel::Disgust),
    ("contempt", EmotionLabel::Disgust),
    ("surprise", EmotionLabel::Surprise),
    ("surprised", EmotionLabel::Surprise),
    ("sur", EmotionLabel::Surprise),
    ("amazement", EmotionLabel::Surprise),
    ("realization", EmotionLabel::Surprise),
    ("neutral", EmotionLabel::Neutral),
    ("neu", EmotionLabel::Neutral),
    ("calm", EmotionLabel::Neutral),
    ("none", EmotionLabel::Neutral),
];

pub(super) fn lookup(key: &str) -> Option<EmotionLabel> {
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == key)
        .map(|&(_, label)| label)
}
