use super::{Dialect, DialectDescriptor, Field, InfoElement};

/// PSI-MS controlled vocabulary accessions the decoder understands
#[allow(missing_docs)]
pub mod cv {
    // Spectrum type
    pub const MS_LEVEL: &str = "MS:1000511";
    pub const MS1_SPECTRUM: &str = "MS:1000579";
    pub const MSN_SPECTRUM: &str = "MS:1000580";
    pub const CENTROID_SPECTRUM: &str = "MS:1000127";
    pub const PROFILE_SPECTRUM: &str = "MS:1000128";
    pub const POSITIVE_SCAN: &str = "MS:1000130";
    pub const NEGATIVE_SCAN: &str = "MS:1000129";

    // Scan/spectrum properties
    pub const SCAN_START_TIME: &str = "MS:1000016";
    pub const TOTAL_ION_CURRENT: &str = "MS:1000285";
    pub const BASE_PEAK_MZ: &str = "MS:1000504";
    pub const BASE_PEAK_INTENSITY: &str = "MS:1000505";
    pub const LOWEST_OBSERVED_MZ: &str = "MS:1000528";
    pub const HIGHEST_OBSERVED_MZ: &str = "MS:1000527";
    pub const FILTER_STRING: &str = "MS:1000512";
    pub const SCAN_WINDOW_LOWER_LIMIT: &str = "MS:1000501";
    pub const SCAN_WINDOW_UPPER_LIMIT: &str = "MS:1000500";

    // Precursor/isolation
    pub const SELECTED_ION_MZ: &str = "MS:1000744";
    pub const PEAK_INTENSITY: &str = "MS:1000042";
    pub const CHARGE_STATE: &str = "MS:1000041";
    pub const ISOLATION_WINDOW_TARGET_MZ: &str = "MS:1000827";
    pub const COLLISION_ENERGY: &str = "MS:1000045";
    pub const CID: &str = "MS:1000133";
    pub const HCD: &str = "MS:1000422";
    pub const ETD: &str = "MS:1000598";
    pub const ECD: &str = "MS:1000250";

    // Binary data
    pub const FLOAT_32_BIT: &str = "MS:1000521";
    pub const FLOAT_64_BIT: &str = "MS:1000523";
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";
    pub const NO_COMPRESSION: &str = "MS:1000576";
    pub const MZ_ARRAY: &str = "MS:1000514";
    pub const INTENSITY_ARRAY: &str = "MS:1000515";

    // File description
    pub const SHA1_CHECKSUM: &str = "MS:1000569";

    // Units
    pub const UNIT_SECOND: &str = "UO:0000010";
    pub const UNIT_MINUTE: &str = "UO:0000031";
    pub const UNIT_MILLISECOND: &str = "UO:0000028";
}

/// Modern controlled-vocabulary schema (mzML, optionally wrapped in indexedmzML)
pub static MODERN: DialectDescriptor = DialectDescriptor {
    dialect: Dialect::Modern,
    root_tags: &["indexedmzML", "mzML"],
    extensions: &["mzml"],
    record_tag: "spectrum",
    record_count_tag: "spectrumList",
    record_count_attribute: "count",
    record_attributes: &[
        ("id", Field::NativeId),
        ("index", Field::RecordIndex),
        ("defaultArrayLength", Field::PeakCount),
    ],
    record_key_attributes: &[("id", Field::NativeId), ("index", Field::RecordIndex)],
    precursor_tag: None,
    precursor_attributes: &[],
    param_tag: Some("cvParam"),
    param_fields: &[
        (cv::MS_LEVEL, Field::MsLevel),
        (cv::MS1_SPECTRUM, Field::ScanTypeFlag),
        (cv::MSN_SPECTRUM, Field::ScanTypeFlag),
        (cv::CENTROID_SPECTRUM, Field::CentroidSpectrum),
        (cv::PROFILE_SPECTRUM, Field::ProfileSpectrum),
        (cv::POSITIVE_SCAN, Field::PositiveScan),
        (cv::NEGATIVE_SCAN, Field::NegativeScan),
        (cv::SCAN_START_TIME, Field::RetentionTime),
        (cv::TOTAL_ION_CURRENT, Field::TotalIonCurrent),
        (cv::BASE_PEAK_MZ, Field::BasePeakMz),
        (cv::BASE_PEAK_INTENSITY, Field::BasePeakIntensity),
        (cv::LOWEST_OBSERVED_MZ, Field::LowMz),
        (cv::HIGHEST_OBSERVED_MZ, Field::HighMz),
        (cv::SCAN_WINDOW_LOWER_LIMIT, Field::ScanWindowLower),
        (cv::SCAN_WINDOW_UPPER_LIMIT, Field::ScanWindowUpper),
        (cv::FILTER_STRING, Field::FilterLine),
        (cv::SELECTED_ION_MZ, Field::PrecursorMz),
        (cv::ISOLATION_WINDOW_TARGET_MZ, Field::IsolationTargetMz),
        (cv::PEAK_INTENSITY, Field::PrecursorIntensity),
        (cv::CHARGE_STATE, Field::PrecursorCharge),
        (cv::COLLISION_ENERGY, Field::CollisionEnergy),
        (cv::CID, Field::ActivationFlag),
        (cv::HCD, Field::ActivationFlag),
        (cv::ETD, Field::ActivationFlag),
        (cv::ECD, Field::ActivationFlag),
        (cv::FLOAT_32_BIT, Field::ArrayFloat32),
        (cv::FLOAT_64_BIT, Field::ArrayFloat64),
        (cv::ZLIB_COMPRESSION, Field::ArrayZlib),
        (cv::NO_COMPRESSION, Field::ArrayNoCompression),
        (cv::MZ_ARRAY, Field::ArrayMz),
        (cv::INTENSITY_ARRAY, Field::ArrayIntensity),
    ],
    array_list_tag: Some("binaryDataArrayList"),
    array_tag: "binaryDataArray",
    array_attributes: &[],
    payload_tag: "binary",
    positional_arrays: false,
    nested_records: false,
    index_offset_tag: "indexListOffset",
    index_tag: "index",
    index_end_tag: "indexList",
    index_name_attribute: "name",
    scan_index_name: "spectrum",
    chromatogram_index_name: Some("chromatogram"),
    offset_tag: "offset",
    offset_key_attribute: "idRef",
    info_elements: &[
        ("run", InfoElement::Run),
        ("spectrumList", InfoElement::RecordList),
        ("sourceFile", InfoElement::ParentFile),
        ("instrumentConfiguration", InfoElement::Model),
        ("source", InfoElement::Ionisation),
        ("analyzer", InfoElement::Analyzer),
        ("detector", InfoElement::Detector),
        ("software", InfoElement::Software),
    ],
};
