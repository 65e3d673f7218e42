use super::{Dialect, DialectDescriptor, Field, InfoElement};

/// Legacy per-scan attribute schema (mzXML)
pub static LEGACY: DialectDescriptor = DialectDescriptor {
    dialect: Dialect::Legacy,
    root_tags: &["mzXML"],
    extensions: &["mzxml"],
    record_tag: "scan",
    record_count_tag: "msRun",
    record_count_attribute: "scanCount",
    record_attributes: &[
        ("num", Field::ScanNumber),
        ("msLevel", Field::MsLevel),
        ("peaksCount", Field::PeakCount),
        ("retentionTime", Field::RetentionTimeDuration),
        ("polarity", Field::Polarity),
        ("centroided", Field::Centroided),
        ("scanType", Field::ScanType),
        ("filterLine", Field::FilterLine),
        ("lowMz", Field::LowMz),
        ("highMz", Field::HighMz),
        ("startMz", Field::ScanWindowLower),
        ("endMz", Field::ScanWindowUpper),
        ("basePeakMz", Field::BasePeakMz),
        ("basePeakIntensity", Field::BasePeakIntensity),
        ("totIonCurrent", Field::TotalIonCurrent),
        ("collisionEnergy", Field::CollisionEnergy),
    ],
    record_key_attributes: &[("num", Field::ScanNumber)],
    precursor_tag: Some("precursorMz"),
    precursor_attributes: &[
        ("precursorIntensity", Field::PrecursorIntensity),
        ("precursorCharge", Field::PrecursorCharge),
        ("activationMethod", Field::ActivationMethod),
    ],
    param_tag: None,
    param_fields: &[],
    array_list_tag: None,
    array_tag: "peaks",
    array_attributes: &[
        ("precision", Field::ArrayPrecision),
        ("compressionType", Field::ArrayCompression),
        ("byteOrder", Field::ArrayByteOrder),
        ("contentType", Field::ArrayContent),
        ("pairOrder", Field::ArrayContent),
    ],
    payload_tag: "peaks",
    positional_arrays: true,
    nested_records: true,
    index_offset_tag: "indexOffset",
    index_tag: "index",
    index_end_tag: "index",
    index_name_attribute: "name",
    scan_index_name: "scan",
    chromatogram_index_name: None,
    offset_tag: "offset",
    offset_key_attribute: "id",
    info_elements: &[
        ("msRun", InfoElement::Run),
        ("parentFile", InfoElement::ParentFile),
        ("msManufacturer", InfoElement::Manufacturer),
        ("msModel", InfoElement::Model),
        ("msIonisation", InfoElement::Ionisation),
        ("msMassAnalyzer", InfoElement::Analyzer),
        ("msDetector", InfoElement::Detector),
        ("software", InfoElement::Software),
    ],
};
