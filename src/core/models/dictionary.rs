//! DICOM tag dictionary
//!
//! Rules may name an attribute by keyword (`SeriesDescription`, in any
//! case) or by tag (`x0008103e`, `0008103E`, `(0008,103E)`). Metadata
//! entities store tags under the canonical `xggggeeee` form so every
//! spelling reaches the same value.

use std::borrow::Cow;

/// A known tag and its keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagDescription {
    /// Canonical tag key (`xggggeeee`)
    pub tag: &'static str,
    /// DICOM keyword
    pub keyword: &'static str,
}

const fn tag(tag: &'static str, keyword: &'static str) -> TagDescription {
    TagDescription { tag, keyword }
}

/// Tags used by hanging protocol rules and image placement
pub const TAGS: &[TagDescription] = &[
    tag("x00080016", "SOPClassUID"),
    tag("x00080018", "SOPInstanceUID"),
    tag("x00080020", "StudyDate"),
    tag("x00080021", "SeriesDate"),
    tag("x00080030", "StudyTime"),
    tag("x00080031", "SeriesTime"),
    tag("x00080050", "AccessionNumber"),
    tag("x00080060", "Modality"),
    tag("x00080061", "ModalitiesInStudy"),
    tag("x00080070", "Manufacturer"),
    tag("x00081030", "StudyDescription"),
    tag("x0008103e", "SeriesDescription"),
    tag("x00100010", "PatientName"),
    tag("x00100020", "PatientID"),
    tag("x00100030", "PatientBirthDate"),
    tag("x00100040", "PatientSex"),
    tag("x00180015", "BodyPartExamined"),
    tag("x00180050", "SliceThickness"),
    tag("x00185101", "ViewPosition"),
    tag("x0020000d", "StudyInstanceUID"),
    tag("x0020000e", "SeriesInstanceUID"),
    tag("x00200010", "StudyID"),
    tag("x00200011", "SeriesNumber"),
    tag("x00200013", "InstanceNumber"),
    tag("x00200020", "PatientOrientation"),
    tag("x00200032", "ImagePositionPatient"),
    tag("x00200037", "ImageOrientationPatient"),
    tag("x00200060", "Laterality"),
    tag("x00200062", "ImageLaterality"),
    tag("x00280008", "NumberOfFrames"),
    tag("x00280010", "Rows"),
    tag("x00280011", "Columns"),
    tag("x00280030", "PixelSpacing"),
];

/// Canonical key of `StudyInstanceUID`
pub const STUDY_INSTANCE_UID: &str = "x0020000d";
/// Canonical key of `SeriesInstanceUID`
pub const SERIES_INSTANCE_UID: &str = "x0020000e";
/// Canonical key of `SOPInstanceUID`
pub const SOP_INSTANCE_UID: &str = "x00080018";
/// Canonical key of `SeriesNumber`
pub const SERIES_NUMBER: &str = "x00200011";
/// Canonical key of `InstanceNumber`
pub const INSTANCE_NUMBER: &str = "x00200013";
/// Canonical key of `Rows`
pub const ROWS: &str = "x00280010";

/// Look up a tag by keyword or tag spelling
#[must_use]
pub fn find(key: &str) -> Option<&'static TagDescription> {
    let canonical = hex_key(key);
    match canonical {
        Some(hex) => TAGS.iter().find(|d| d.tag == hex),
        None => TAGS.iter().find(|d| d.keyword.eq_ignore_ascii_case(key)),
    }
}

/// The key under which a tag is stored
///
/// Known keywords and every tag spelling map to `xggggeeee`; anything else
/// is kept as given.
#[must_use]
pub fn canonical_key(key: &str) -> Cow<'_, str> {
    if let Some(hex) = hex_key(key) {
        return Cow::Owned(hex);
    }
    TAGS.iter()
        .find(|d| d.keyword.eq_ignore_ascii_case(key))
        .map_or(Cow::Borrowed(key), |d| Cow::Borrowed(d.tag))
}

fn hex_key(key: &str) -> Option<String> {
    let digits: String = if let Some(rest) = key.strip_prefix('x') {
        rest.to_string()
    } else if key.starts_with('(') && key.ends_with(')') {
        key[1..key.len() - 1].replace(',', "")
    } else {
        key.to_string()
    };
    if digits.len() == 8 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("x{}", digits.to_ascii_lowercase()))
    } else {
        None
    }
}
