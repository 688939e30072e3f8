//! Media size post-processing for fetched capabilities.
//!
//! Display names come from the cloud print CDD naming scheme. Sizes are
//! grouped the way the CDD guide lists them: North American, Chinese, ISO,
//! Japanese, other metric, then custom.

use std::cmp::Ordering;

use serde_json::Value;
use store_logging::store_debug;

use crate::Capabilities;

const MEDIA_DISPLAY_NAMES: &[(&str, &str)] = &[
    ("ISO_2A0", "2A0"),
    ("ISO_A0", "A0"),
    ("ISO_A1", "A1"),
    ("ISO_A2", "A2"),
    ("ISO_A3", "A3"),
    ("ISO_A3_EXTRA", "A3 Extra"),
    ("ISO_A4", "A4"),
    ("ISO_A4_EXTRA", "A4 Extra"),
    ("ISO_A4_TAB", "A4 Tab"),
    ("ISO_A5", "A5"),
    ("ISO_A5_EXTRA", "A5 Extra"),
    ("ISO_A6", "A6"),
    ("ISO_A7", "A7"),
    ("ISO_A8", "A8"),
    ("ISO_A9", "A9"),
    ("ISO_A10", "A10"),
    ("ISO_B0", "B0"),
    ("ISO_B1", "B1"),
    ("ISO_B2", "B2"),
    ("ISO_B3", "B3"),
    ("ISO_B4", "B4"),
    ("ISO_B5", "B5"),
    ("ISO_B5_EXTRA", "B5 Extra"),
    ("ISO_B6", "B6"),
    ("ISO_C4", "C4"),
    ("ISO_C5", "C5"),
    ("ISO_C6", "C6"),
    ("ISO_DL", "Envelope DL"),
    ("JIS_B4", "B4 (JIS)"),
    ("JIS_B5", "B5 (JIS)"),
    ("JPN_HAGAKI", "Hagaki"),
    ("JPN_KAHU", "Kahu Envelope"),
    ("JPN_KAKU2", "Kaku 2"),
    ("JPN_OUFUKU", "Oufuku Hagaki"),
    ("JPN_YOU4", "You 4"),
    ("NA_5X7", "5x7"),
    ("NA_6X9", "6x9"),
    ("NA_10X15", "10x15"),
    ("NA_ARCH_A", "Arch A"),
    ("NA_ARCH_B", "Arch B"),
    ("NA_EXECUTIVE", "Executive"),
    ("NA_GOVT_LEGAL", "Government Legal"),
    ("NA_GOVT_LETTER", "Government Letter"),
    ("NA_INDEX_3X5", "Index 3x5"),
    ("NA_INDEX_4X6", "Index 4x6"),
    ("NA_INDEX_5X8", "5x8"),
    ("NA_INVOICE", "Invoice"),
    // Ledger in portrait is called Tabloid.
    ("NA_LEDGER", "Tabloid"),
    ("NA_LEGAL", "Legal"),
    ("NA_LEGAL_EXTRA", "Legal extra"),
    ("NA_LETTER", "Letter"),
    ("NA_LETTER_EXTRA", "Letter extra"),
    ("NA_LETTER_PLUS", "Letter plus"),
    ("NA_MONARCH", "Monarch"),
    ("NA_NUMBER_9", "Envelope #9"),
    ("NA_NUMBER_10", "Envelope #10"),
    ("NA_PERSONAL", "Personal"),
    ("NA_QUARTO", "Quarto"),
    ("NA_SUPER_A", "Super A"),
    ("NA_SUPER_B", "Super B"),
    ("OM_DAI_PA_KAI", "Dai-pa-kai"),
    ("OM_FOLIO", "Folio"),
    ("OM_FOLIO_SP", "Folio SP"),
    ("OM_INVITE", "Invite Envelope"),
    ("OM_ITALIAN", "Italian Envelope"),
    ("OM_JUURO_KU_KAI", "Juuro-ku-kai"),
    ("OM_LARGE_PHOTO", "Large photo"),
    ("OM_OFICIO", "Oficio"),
    ("OM_PA_KAI", "Pa-kai"),
    ("OM_POSTFIX", "Postfix Envelope"),
    ("OM_SMALL_PHOTO", "Small photo"),
    ("PRC_1", "prc1 Envelope"),
    ("PRC_16K", "prc 16k"),
    ("PRC_32K", "prc 32k"),
    ("ROC_16K", "ROC 16K"),
    ("ROC_8K", "ROC 8k"),
];

/// Human readable name of a CDD media size, if one is known.
pub fn media_display_name(name: &str) -> Option<&'static str> {
    MEDIA_DISPLAY_NAMES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, display)| *display)
}

fn media_options(capabilities: &mut Capabilities) -> Option<&mut Vec<Value>> {
    capabilities
        .0
        .get_mut("printer")?
        .get_mut("media_size")?
        .get_mut("option")?
        .as_array_mut()
}

/// Empty strings, `false`, zero and null count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fills in `custom_display_name` for media sizes that carry no localized
/// name, falling back to the raw media name.
pub fn localize_capabilities(capabilities: &mut Capabilities) {
    let Some(options) = media_options(capabilities) else {
        return;
    };
    for option in options.iter_mut().filter_map(Value::as_object_mut) {
        let localized = option
            .get("custom_display_name_localized")
            .is_some_and(is_truthy);
        if localized {
            continue;
        }
        let has_custom = option
            .get("custom_display_name")
            .and_then(Value::as_str)
            .is_some_and(|name| !name.is_empty());
        if has_custom {
            continue;
        }
        let name = option.get("name").and_then(Value::as_str).unwrap_or_default();
        let display = media_display_name(name).unwrap_or(name).to_string();
        option.insert("custom_display_name".to_string(), Value::String(display));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MediaCategory {
    NorthAmerican,
    Chinese,
    Iso,
    Japanese,
    OtherMetric,
    Custom,
}

fn categorize(name: &str) -> MediaCategory {
    if name.starts_with("NA_") {
        MediaCategory::NorthAmerican
    } else if name.starts_with("PRC_")
        || name.starts_with("ROC_")
        || matches!(name, "OM_DAI_PA_KAI" | "OM_JUURO_KU_KAI" | "OM_PA_KAI")
    {
        MediaCategory::Chinese
    } else if name.starts_with("ISO_") {
        MediaCategory::Iso
    } else if name.starts_with("JIS_") || name.starts_with("JPN_") {
        MediaCategory::Japanese
    } else if name.starts_with("OM_") {
        MediaCategory::OtherMetric
    } else {
        if name != "CUSTOM" {
            store_debug!("Unknown media size {}, assuming custom", name);
        }
        MediaCategory::Custom
    }
}

fn display_name_of(option: &Value) -> &str {
    let localized = option
        .get("custom_display_name_localized")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty());
    localized
        .or_else(|| option.get("custom_display_name").and_then(Value::as_str))
        .unwrap_or_default()
}

/// Sorts media sizes by category, then by display name within a category.
pub fn sort_media_sizes(capabilities: &mut Capabilities) {
    let Some(options) = media_options(capabilities) else {
        return;
    };
    options.sort_by(|a, b| {
        let category = |option: &Value| {
            categorize(option.get("name").and_then(Value::as_str).unwrap_or("CUSTOM"))
        };
        match category(a).cmp(&category(b)) {
            Ordering::Equal => display_name_of(a).cmp(display_name_of(b)),
            other => other,
        }
    });
}
