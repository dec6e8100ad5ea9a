use serde::Serialize;

/// Recognition and synthesis language tags for one UI locale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceLanguage {
    pub recognition: &'static str,
    pub synthesis: &'static str,
}

impl VoiceLanguage {
    pub const ENGLISH: Self = Self {
        recognition: "en-US",
        synthesis: "en-US",
    };
    pub const MANDARIN: Self = Self {
        recognition: "zh-CN",
        synthesis: "zh-CN",
    };
    // zh-HK synthesis voices are more widely available than yue-Hant-HK
    pub const CANTONESE: Self = Self {
        recognition: "yue-Hant-HK",
        synthesis: "zh-HK",
    };

    /// Map a UI locale to speech languages, defaulting to English
    pub fn from_locale(locale: &str) -> Self {
        match locale {
            "zh-CN" => Self::MANDARIN,
            "zh-HK" => Self::CANTONESE,
            _ => Self::ENGLISH,
        }
    }
}

impl Default for VoiceLanguage {
    fn default() -> Self {
        Self::ENGLISH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_mapping() {
        assert_eq!(VoiceLanguage::from_locale("zh-CN"), VoiceLanguage::MANDARIN);
        assert_eq!(VoiceLanguage::from_locale("zh-HK").recognition, "yue-Hant-HK");
        assert_eq!(VoiceLanguage::from_locale("zh-HK").synthesis, "zh-HK");
        assert_eq!(VoiceLanguage::from_locale("en"), VoiceLanguage::ENGLISH);
        assert_eq!(VoiceLanguage::from_locale("fr-FR"), VoiceLanguage::ENGLISH);
    }
}
