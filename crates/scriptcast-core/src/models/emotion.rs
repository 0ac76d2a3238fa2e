use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Vocal delivery style applied to a synthesized script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Excited,
    Confident,
    Empathetic,
    Calm,
    Playful,
    Urgent,
    Authoritative,
    Friendly,
    Inspirational,
    Serious,
    Mysterious,
    Grateful,
}

impl Emotion {
    pub const ALL: [Emotion; 12] = [
        Emotion::Excited,
        Emotion::Confident,
        Emotion::Empathetic,
        Emotion::Calm,
        Emotion::Playful,
        Emotion::Urgent,
        Emotion::Authoritative,
        Emotion::Friendly,
        Emotion::Inspirational,
        Emotion::Serious,
        Emotion::Mysterious,
        Emotion::Grateful,
    ];

    /// Pool that `EmotionChoice::Random` draws from for manually entered scripts.
    pub const RANDOM_POOL: [Emotion; 6] = [
        Emotion::Calm,
        Emotion::Friendly,
        Emotion::Confident,
        Emotion::Playful,
        Emotion::Excited,
        Emotion::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Excited => "Excited",
            Emotion::Confident => "Confident",
            Emotion::Empathetic => "Empathetic",
            Emotion::Calm => "Calm",
            Emotion::Playful => "Playful",
            Emotion::Urgent => "Urgent",
            Emotion::Authoritative => "Authoritative",
            Emotion::Friendly => "Friendly",
            Emotion::Inspirational => "Inspirational",
            Emotion::Serious => "Serious",
            Emotion::Mysterious => "Mysterious",
            Emotion::Grateful => "Grateful",
        }
    }
}

impl Display for Emotion {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| anyhow::anyhow!("Invalid emotion: {}", s))
    }
}

/// Emotion selection for a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmotionChoice {
    Fixed(Emotion),
    /// Resolved per script, uniformly over [`Emotion::RANDOM_POOL`].
    Random,
}

impl FromStr for EmotionChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("random") {
            return Ok(EmotionChoice::Random);
        }
        s.parse().map(EmotionChoice::Fixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("friendly".parse::<Emotion>().unwrap(), Emotion::Friendly);
        assert_eq!(" CALM ".parse::<Emotion>().unwrap(), Emotion::Calm);
        assert!("Angry".parse::<Emotion>().is_err());
    }

    #[test]
    fn test_display_round_trips_every_variant() {
        for emotion in Emotion::ALL {
            assert_eq!(emotion.to_string().parse::<Emotion>().unwrap(), emotion);
        }
    }

    #[test]
    fn test_random_pool_is_subset() {
        assert!(Emotion::RANDOM_POOL.iter().all(|e| Emotion::ALL.contains(e)));
    }

    #[test]
    fn test_emotion_choice_parse() {
        assert_eq!("Random".parse::<EmotionChoice>().unwrap(), EmotionChoice::Random);
        assert_eq!(
            "urgent".parse::<EmotionChoice>().unwrap(),
            EmotionChoice::Fixed(Emotion::Urgent)
        );
        assert!("".parse::<EmotionChoice>().is_err());
    }

    #[test]
    fn test_serde_uses_variant_names() {
        let json = serde_json::to_string(&Emotion::Inspirational).unwrap();
        assert_eq!(json, "\"Inspirational\"");
    }
}
