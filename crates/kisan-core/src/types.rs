//! Shared types used across flows and the public API

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Language the farmer wants advice in
///
/// Serialized as ISO-639-1 codes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "hi")]
    Hindi,
    #[serde(rename = "mr")]
    Marathi,
    #[serde(rename = "ta")]
    Tamil,
    #[serde(rename = "te")]
    Telugu,
    #[serde(rename = "kn")]
    Kannada,
    #[serde(rename = "bn")]
    Bengali,
    #[serde(rename = "pa")]
    Punjabi,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Marathi => "mr",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Kannada => "kn",
            Language::Bengali => "bn",
            Language::Punjabi => "pa",
        }
    }

    /// English name, used inside prompts
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Marathi => "Marathi",
            Language::Tamil => "Tamil",
            Language::Telugu => "Telugu",
            Language::Kannada => "Kannada",
            Language::Bengali => "Bengali",
            Language::Punjabi => "Punjabi",
        }
    }

    /// Generic message shown when an advisory could not be produced
    pub fn failure_message(&self) -> &'static str {
        match self {
            Language::English => "Something went wrong, please try again.",
            Language::Hindi => "कुछ गलत हो गया, कृपया पुनः प्रयास करें।",
            Language::Marathi => "काहीतरी चूक झाली, कृपया पुन्हा प्रयत्न करा.",
            Language::Tamil => "ஏதோ தவறு நடந்துவிட்டது, தயவுசெய்து மீண்டும் முயற்சிக்கவும்.",
            Language::Telugu => "ఏదో తప్పు జరిగింది, దయచేసి మళ్లీ ప్రయత్నించండి.",
            Language::Kannada => "ಏನೋ ತಪ್ಪಾಗಿದೆ, ದಯವಿಟ್ಟು ಮತ್ತೆ ಪ್ರಯತ್ನಿಸಿ.",
            Language::Bengali => "কিছু ভুল হয়েছে, অনুগ্রহ করে আবার চেষ্টা করুন।",
            Language::Punjabi => "ਕੁਝ ਗਲਤ ਹੋ ਗਿਆ, ਕਿਰਪਾ ਕਰਕੇ ਦੁਬਾਰਾ ਕੋਸ਼ਿਸ਼ ਕਰੋ।",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "hi" | "hindi" => Ok(Language::Hindi),
            "mr" | "marathi" => Ok(Language::Marathi),
            "ta" | "tamil" => Ok(Language::Tamil),
            "te" | "telugu" => Ok(Language::Telugu),
            "kn" | "kannada" => Ok(Language::Kannada),
            "bn" | "bengali" => Ok(Language::Bengali),
            "pa" | "punjabi" => Ok(Language::Punjabi),
            _ => Err(format!("Unknown language: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_parse() {
        assert_eq!("hi".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!("Marathi".parse::<Language>().unwrap(), Language::Marathi);
        assert!("xx".parse::<Language>().is_err());
    }

    #[test]
    fn test_language_serde_uses_codes() {
        assert_eq!(serde_json::to_string(&Language::Tamil).unwrap(), "\"ta\"");
        let lang: Language = serde_json::from_str("\"pa\"").unwrap();
        assert_eq!(lang, Language::Punjabi);
    }

    #[test]
    fn test_failure_message_is_localized_for_every_language() {
        let all = [
            Language::English,
            Language::Hindi,
            Language::Marathi,
            Language::Tamil,
            Language::Telugu,
            Language::Kannada,
            Language::Bengali,
            Language::Punjabi,
        ];
        let messages: std::collections::HashSet<&str> =
            all.iter().map(|l| l.failure_message()).collect();
        assert_eq!(messages.len(), all.len());
        assert_eq!(
            Language::English.failure_message(),
            "Something went wrong, please try again."
        );
    }
}
