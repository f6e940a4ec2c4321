//! Language identification for short tag strings.
//!
//! [`LanguageDetector`] is the seam where an identifier plugs in.
//! [`WhatlangDetector`] scores trigram profiles and tells Latin-script
//! languages apart. [`ScriptDetector`] only reads the Unicode script and the
//! diacritics of the text, so it separates scripts well and reads plain Latin
//! text as English.

use crate::config::LanguageModel;

/// One language prediction for a piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// ISO 639-1 code ("en", "fr", ...)
    pub language: String,
    /// Confidence in [0, 1]
    pub confidence: f32,
}

impl Prediction {
    /// Create a prediction.
    pub fn new(language: impl Into<String>, confidence: f32) -> Self {
        Self {
            language: language.into(),
            confidence,
        }
    }
}

/// Predicts the language of a short text.
pub trait LanguageDetector {
    /// Most likely language of `text` with its confidence.
    fn detect(&self, text: &str) -> Prediction;
}

/// Language codes the script heuristic can produce, in scoring-slot order.
const CODES: [&str; 12] = [
    "en", "de", "fr", "es", "ru", "zh", "ja", "ko", "ar", "he", "el", "th",
];

const EN: usize = 0;
const DE: usize = 1;
const FR: usize = 2;
const ES: usize = 3;
const RU: usize = 4;
const ZH: usize = 5;
const JA: usize = 6;
const KO: usize = 7;
const AR: usize = 8;
const HE: usize = 9;
const EL: usize = 10;
const TH: usize = 11;

/// Weight of a language-specific diacritic relative to a plain Latin letter.
const DIACRITIC_WEIGHT: usize = 5;

/// Unicode-script heuristic detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptDetector;

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Prediction {
        let mut scores = [0usize; CODES.len()];

        for c in text.chars().filter(|c| c.is_alphabetic()) {
            match c {
                '\u{4e00}'..='\u{9fff}' => scores[ZH] += 1,
                '\u{3040}'..='\u{30ff}' => scores[JA] += 1,
                '\u{ac00}'..='\u{d7af}' | '\u{1100}'..='\u{11ff}' => scores[KO] += 1,
                '\u{0600}'..='\u{06ff}' => scores[AR] += 1,
                '\u{0590}'..='\u{05ff}' => scores[HE] += 1,
                '\u{0400}'..='\u{04ff}' => scores[RU] += 1,
                '\u{0370}'..='\u{03ff}' => scores[EL] += 1,
                '\u{0e00}'..='\u{0e7f}' => scores[TH] += 1,
                'a'..='z' | 'A'..='Z' => scores[EN] += 1,
                'ß' | 'ä' | 'ö' | 'ü' | 'Ä' | 'Ö' | 'Ü' => scores[DE] += DIACRITIC_WEIGHT,
                'à' | 'â' | 'ç' | 'é' | 'è' | 'ê' | 'ë' | 'î' | 'ï' | 'ô' | 'û' | 'ù' | 'œ' => {
                    scores[FR] += DIACRITIC_WEIGHT
                }
                'ñ' | 'á' | 'í' | 'ó' | 'ú' => scores[ES] += DIACRITIC_WEIGHT,
                _ => {}
            }
        }

        // Kana next to Han characters means Japanese written with kanji.
        if scores[ZH] > 0 && scores[JA] > 0 {
            scores[JA] += scores[ZH];
            scores[ZH] = 0;
        }

        // A diacritic marks the whole word, so the plain letters count toward it.
        let latin_specific = scores[DE] + scores[FR] + scores[ES];
        if latin_specific > 0 {
            let best = [DE, FR, ES]
                .into_iter()
                .max_by_key(|&i| (scores[i], std::cmp::Reverse(i)))
                .unwrap_or(EN);
            scores[best] += scores[EN];
            scores[EN] = 0;
        }

        let total: usize = scores.iter().sum();
        if total == 0 {
            return Prediction::new(CODES[EN], 0.0);
        }

        // First slot wins ties.
        let (best, &best_score) = scores
            .iter()
            .enumerate()
            .max_by_key(|&(i, &s)| (s, std::cmp::Reverse(i)))
            .unwrap_or((EN, &0));

        Prediction::new(CODES[best], best_score as f32 / total as f32)
    }
}

/// Trigram-profile detector backed by `whatlang`.
///
/// Codes are reported as ISO 639-1 where one exists. Text with no
/// recognisable script falls back to [`ScriptDetector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Prediction {
        match whatlang::detect(text) {
            Some(info) => Prediction::new(
                iso639_1(info.lang().code()),
                info.confidence() as f32,
            ),
            None => ScriptDetector.detect(text),
        }
    }
}

/// The detector selected by `[language] model`.
pub fn detector_for(model: LanguageModel) -> &'static dyn LanguageDetector {
    match model {
        LanguageModel::Whatlang => &WhatlangDetector,
        LanguageModel::Script => &ScriptDetector,
    }
}

/// Map a `whatlang` ISO 639-3 code to the two-letter code the lookup tables use.
///
/// Codes without a two-letter form are returned unchanged.
fn iso639_1(code: &'static str) -> &'static str {
    match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "no",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        other => other,
    }
}
