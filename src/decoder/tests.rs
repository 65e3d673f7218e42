use super::*;
use crate::codec::{ByteOrder, CodecError, Compression, Precision};
use crate::dialect::{Dialect, LEGACY, MODERN};
use crate::models::Polarity;

use base64::prelude::*;

const MODERN_SPECTRUM: &str = r#"<spectrum index="0" id="controllerType=0 controllerNumber=1 scan=7" defaultArrayLength="2">
  <cvParam cvRef="MS" accession="MS:1000511" name="ms level" value="2"/>
  <cvParam cvRef="MS" accession="MS:1000580" name="MSn spectrum"/>
  <cvParam cvRef="MS" accession="MS:1000127" name="centroid spectrum"/>
  <cvParam cvRef="MS" accession="MS:1000129" name="negative scan"/>
  <cvParam cvRef="MS" accession="MS:1000285" name="total ion current" value="300.0"/>
  <scanList count="1">
    <scan>
      <cvParam cvRef="MS" accession="MS:1000016" name="scan start time" value="1.5" unitCvRef="UO" unitAccession="UO:0000031" unitName="minute"/>
      <cvParam cvRef="MS" accession="MS:1000512" name="filter string" value="FTMS - c NSI d Full ms2 445.12@hcd30.00"/>
      <scanWindowList count="1">
        <scanWindow>
          <cvParam cvRef="MS" accession="MS:1000501" name="scan window lower limit" value="50.0"/>
          <cvParam cvRef="MS" accession="MS:1000500" name="scan window upper limit" value="1000.0"/>
        </scanWindow>
      </scanWindowList>
    </scan>
  </scanList>
  <precursorList count="1">
    <precursor spectrumRef="controllerType=0 controllerNumber=1 scan=6">
      <isolationWindow>
        <cvParam cvRef="MS" accession="MS:1000827" name="isolation window target m/z" value="445.0"/>
      </isolationWindow>
      <selectedIonList count="1">
        <selectedIon>
          <cvParam cvRef="MS" accession="MS:1000744" name="selected ion m/z" value="445.12"/>
          <cvParam cvRef="MS" accession="MS:1000041" name="charge state" value="2"/>
        </selectedIon>
      </selectedIonList>
      <activation>
        <cvParam cvRef="MS" accession="MS:1000422" name="beam-type collision-induced dissociation"/>
        <cvParam cvRef="MS" accession="MS:1000045" name="collision energy" value="30.0"/>
      </activation>
    </precursor>
  </precursorList>
  <binaryDataArrayList count="2">
    <binaryDataArray encodedLength="24">
      <cvParam cvRef="MS" accession="MS:1000523" name="64-bit float"/>
      <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
      <cvParam cvRef="MS" accession="MS:1000514" name="m/z array"/>
      <binary>AAAAAAAAWUAAAAAAAABpQA==</binary>
    </binaryDataArray>
    <binaryDataArray encodedLength="12">
      <cvParam cvRef="MS" accession="MS:1000521" name="32-bit float"/>
      <cvParam cvRef="MS" accession="MS:1000576" name="no compression"/>
      <cvParam cvRef="MS" accession="MS:1000515" name="intensity array"/>
      <binary>AADIQgAASEM=</binary>
    </binaryDataArray>
  </binaryDataArrayList>
</spectrum>
<spectrum index="1" id="controllerType=0 controllerNumber=1 scan=8" defaultArrayLength="0">
</spectrum>"#;

/// Network-order 32-bit interleaved pairs, as legacy files store them
fn legacy_pairs(pairs: &[(f32, f32)]) -> String {
    let mut bytes = Vec::new();
    for (mz, intensity) in pairs {
        bytes.extend_from_slice(&mz.to_be_bytes());
        bytes.extend_from_slice(&intensity.to_be_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

fn legacy_run() -> String {
    format!(
        r#"<scan num="1" msLevel="1" peaksCount="2" polarity="+" centroided="1" retentionTime="PT60.5S" lowMz="100" highMz="200" basePeakMz="200" basePeakIntensity="2000" totIonCurrent="3000">
    <peaks precision="32" byteOrder="network" pairOrder="m/z-int">{}</peaks>
    <scan num="2" msLevel="2" peaksCount="1" retentionTime="PT61S" collisionEnergy="35">
      <precursorMz precursorIntensity="5000" precursorCharge="3" activationMethod="CID">150.25</precursorMz>
      <peaks precision="32" byteOrder="network" pairOrder="m/z-int">{}</peaks>
    </scan>
  </scan>"#,
        legacy_pairs(&[(100.0, 1000.0), (200.0, 2000.0)]),
        legacy_pairs(&[(120.5, 10.0)])
    )
}

#[test]
fn test_modern_full_decode() {
    let decoder = ScanRecordDecoder::new(&MODERN);
    let scan = decoder.read_scan(MODERN_SPECTRUM.as_bytes(), 1234).unwrap();
    let header = &scan.header;

    assert_eq!(header.scan_number, 7);
    assert_eq!(header.offset, 1234);
    assert_eq!(header.ms_level, 2);
    assert_eq!(header.peak_count, 2);
    assert_eq!(header.polarity, Polarity::Negative);
    assert_eq!(header.centroided, Some(true));
    assert_eq!(header.scan_type.as_deref(), Some("MSn spectrum"));
    assert!((header.retention_time.unwrap() - 90.0).abs() < 1e-9);
    assert_eq!(header.low_mz, Some(50.0));
    assert_eq!(header.high_mz, Some(1000.0));
    assert_eq!(header.collision_energy, Some(30.0));

    let precursor = header.precursor.as_ref().unwrap();
    assert_eq!(precursor.mz, Some(445.12));
    assert_eq!(precursor.charge, Some(2));
    assert_eq!(
        precursor.activation.as_deref(),
        Some("beam-type collision-induced dissociation")
    );

    assert_eq!(scan.masses, vec![100.0, 200.0]);
    assert_eq!(scan.intensities, vec![100.0, 200.0]);

    let mz = header.mz_encoding.unwrap();
    let intensity = header.intensity_encoding.unwrap();
    assert_eq!(mz.precision, Precision::Float64);
    assert_eq!(intensity.precision, Precision::Float32);
    assert_eq!(mz.compression, Compression::None);
}

#[test]
fn test_modern_header_only_skips_payloads() {
    // Payloads are never decoded in header mode
    let xml = MODERN_SPECTRUM.replace("AAAAAAAAWUAAAAAAAABpQA==", "!!not base64!!");
    let decoder = ScanRecordDecoder::new(&MODERN);

    let header = decoder.read_header(xml.as_bytes(), 0).unwrap();
    assert_eq!(header.scan_number, 7);
    assert_eq!(header.peak_count, 2);
    assert_eq!(header.mz_encoding.unwrap().precision, Precision::Float64);
    assert_eq!(header.intensity_encoding.unwrap().precision, Precision::Float32);

    let err = decoder.read_scan(xml.as_bytes(), 0).unwrap_err();
    assert!(
        matches!(
            err,
            RecordError::Codec {
                array: ArrayKind::Mz,
                source: CodecError::Base64(_)
            }
        ),
        "got {err:?}"
    );
}

#[test]
fn test_header_matches_full_decode() {
    let modern = ScanRecordDecoder::new(&MODERN);
    let header = modern.read_header(MODERN_SPECTRUM.as_bytes(), 10).unwrap();
    let scan = modern.read_scan(MODERN_SPECTRUM.as_bytes(), 10).unwrap();
    assert_eq!(header, scan.header);

    let legacy = ScanRecordDecoder::new(&LEGACY);
    let xml = legacy_run();
    let header = legacy.read_header(xml.as_bytes(), 0).unwrap();
    let scan = legacy.read_scan(xml.as_bytes(), 0).unwrap();
    assert_eq!(header, scan.header);
}

#[test]
fn test_truncated_record_fails_in_both_modes() {
    let cut = MODERN_SPECTRUM.find("AAAAAAAAWUAA").unwrap() + 4;
    let truncated = &MODERN_SPECTRUM[..cut];
    let decoder = ScanRecordDecoder::new(&MODERN);

    assert!(decoder.read_header(truncated.as_bytes(), 0).is_err());
    let err = decoder.read_scan(truncated.as_bytes(), 0).unwrap_err();
    assert!(matches!(err, RecordError::UnexpectedEof), "got {err:?}");
}

#[test]
fn test_modern_empty_record() {
    let start = MODERN_SPECTRUM.find(r#"<spectrum index="1""#).unwrap();
    let decoder = ScanRecordDecoder::new(&MODERN);
    let scan = decoder.read_scan(MODERN_SPECTRUM[start..].as_bytes(), start as u64).unwrap();

    assert_eq!(scan.header.scan_number, 8);
    assert_eq!(scan.header.ms_level, 1);
    assert!(scan.masses.is_empty());
    assert!(scan.intensities.is_empty());
}

#[test]
fn test_modern_scan_number_from_index() {
    let xml = r#"<spectrum index="4" id="sample=1 period=1 cycle=3" defaultArrayLength="0"/>"#;
    let header = ScanRecordDecoder::new(&MODERN).read_header(xml.as_bytes(), 0).unwrap();
    assert_eq!(header.scan_number, 5);
    assert_eq!(header.native_id.as_deref(), Some("sample=1 period=1 cycle=3"));
}

#[test]
fn test_missing_intensity_array() {
    let end = MODERN_SPECTRUM.find("<binaryDataArray encodedLength=\"12\">").unwrap();
    let xml = format!(
        "{}</binaryDataArrayList></spectrum>",
        &MODERN_SPECTRUM[..end]
    );
    let err = ScanRecordDecoder::new(&MODERN)
        .read_scan(xml.as_bytes(), 0)
        .unwrap_err();
    assert!(matches!(err, RecordError::MissingArray(ArrayKind::Intensity, 2)));
}

#[test]
fn test_length_mismatch_names_array() {
    let xml = MODERN_SPECTRUM.replacen(r#"defaultArrayLength="2""#, r#"defaultArrayLength="3""#, 1);
    let err = ScanRecordDecoder::new(&MODERN)
        .read_scan(xml.as_bytes(), 0)
        .unwrap_err();
    match err {
        RecordError::Codec {
            array: ArrayKind::Mz,
            source: CodecError::LengthMismatch { expected, actual },
        } => {
            assert_eq!(expected, 24);
            assert_eq!(actual, 16);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_legacy_interleaved_pairs() {
    let xml = legacy_run();
    let decoder = ScanRecordDecoder::new(&LEGACY);
    let scan = decoder.read_scan(xml.as_bytes(), 0).unwrap();
    let header = &scan.header;

    assert_eq!(header.scan_number, 1);
    assert_eq!(header.ms_level, 1);
    assert_eq!(header.polarity, Polarity::Positive);
    assert_eq!(header.centroided, Some(true));
    assert!((header.retention_time.unwrap() - 60.5).abs() < 1e-9);
    assert_eq!(header.base_peak_intensity, Some(2000.0));
    assert!(header.precursor.is_none());

    let encoding = header.mz_encoding.unwrap();
    assert_eq!(encoding.byte_order, ByteOrder::Network);
    assert_eq!(encoding.precision, Precision::Float32);
    assert_eq!(header.intensity_encoding, Some(encoding));

    assert_eq!(scan.masses, vec![100.0, 200.0]);
    assert_eq!(scan.intensities, vec![1000.0, 2000.0]);
}

#[test]
fn test_legacy_nested_scan() {
    let xml = legacy_run();
    let start = xml.find(r#"<scan num="2""#).unwrap();
    let decoder = ScanRecordDecoder::new(&LEGACY);
    let scan = decoder.read_scan(xml[start..].as_bytes(), start as u64).unwrap();
    let header = &scan.header;

    assert_eq!(header.scan_number, 2);
    assert_eq!(header.ms_level, 2);
    assert_eq!(header.offset, start as u64);
    assert_eq!(header.collision_energy, Some(35.0));

    let precursor = header.precursor.as_ref().unwrap();
    assert_eq!(precursor.mz, Some(150.25));
    assert_eq!(precursor.intensity, Some(5000.0));
    assert_eq!(precursor.charge, Some(3));
    assert_eq!(precursor.activation.as_deref(), Some("CID"));

    assert_eq!(scan.masses, vec![120.5]);
    assert_eq!(scan.intensities, vec![10.0]);
}

#[test]
fn test_legacy_header_skips_peaks() {
    let xml = r#"<scan num="3" msLevel="1" peaksCount="10"><peaks precision="64" compressionType="zlib">!!not base64</peaks></scan>"#;
    let header = ScanRecordDecoder::new(&LEGACY).read_header(xml.as_bytes(), 0).unwrap();
    assert_eq!(header.scan_number, 3);
    let encoding = header.mz_encoding.unwrap();
    assert_eq!(encoding.precision, Precision::Float64);
    assert_eq!(encoding.compression, Compression::Zlib);
    assert_eq!(encoding.byte_order, ByteOrder::Little);
    assert_eq!(header.intensity_encoding, Some(encoding));
}

/// Little-endian 32-bit values without any byte-order declaration
fn little_endian(values: &[f32]) -> String {
    let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    BASE64_STANDARD.encode(bytes)
}

#[test]
fn test_legacy_typed_arrays_default_to_little_endian() {
    let xml = format!(
        r#"<scan num="1" msLevel="1" peaksCount="2">
    <peaks precision="32" contentType="m/z">{}</peaks>
    <peaks precision="32" contentType="intensity">{}</peaks>
  </scan>"#,
        little_endian(&[100.0, 101.0]),
        little_endian(&[10.0, 5.0])
    );
    let scan = ScanRecordDecoder::new(&LEGACY).read_scan(xml.as_bytes(), 0).unwrap();

    assert_eq!(scan.masses, vec![100.0, 101.0]);
    assert_eq!(scan.intensities, vec![10.0, 5.0]);
    assert_eq!(scan.header.mz_encoding.unwrap().byte_order, ByteOrder::Little);
}

#[test]
fn test_legacy_untyped_arrays_are_positional() {
    let xml = format!(
        r#"<scan num="1" msLevel="1" peaksCount="2">
    <peaks precision="32">{}</peaks>
    <peaks precision="32">{}</peaks>
  </scan>"#,
        little_endian(&[100.0, 101.0]),
        little_endian(&[10.0, 5.0])
    );
    let scan = ScanRecordDecoder::new(&LEGACY).read_scan(xml.as_bytes(), 0).unwrap();

    assert_eq!(scan.masses, vec![100.0, 101.0]);
    assert_eq!(scan.intensities, vec![10.0, 5.0]);
}

#[test]
fn test_legacy_untyped_array_fills_missing_slot() {
    let xml = format!(
        r#"<scan num="1" msLevel="1" peaksCount="2">
    <peaks precision="32" contentType="m/z">{}</peaks>
    <peaks precision="32">{}</peaks>
  </scan>"#,
        little_endian(&[100.0, 101.0]),
        little_endian(&[10.0, 5.0])
    );
    let scan = ScanRecordDecoder::new(&LEGACY).read_scan(xml.as_bytes(), 0).unwrap();

    assert_eq!(scan.masses, vec![100.0, 101.0]);
    assert_eq!(scan.intensities, vec![10.0, 5.0]);
}

#[test]
fn test_legacy_lone_untyped_array_holds_pairs() {
    let xml = format!(
        r#"<scan num="1" msLevel="1" peaksCount="2"><peaks precision="32">{}</peaks></scan>"#,
        little_endian(&[100.0, 10.0, 101.0, 5.0])
    );
    let scan = ScanRecordDecoder::new(&LEGACY).read_scan(xml.as_bytes(), 0).unwrap();

    assert_eq!(scan.masses, vec![100.0, 101.0]);
    assert_eq!(scan.intensities, vec![10.0, 5.0]);
}

#[test]
fn test_escaped_attribute_values() {
    let xml = r#"<scan num="4" msLevel="1" peaksCount="0" filterLine="FTMS + p &amp; &lt;ms&gt;"/>"#;
    let header = ScanRecordDecoder::new(&LEGACY).read_header(xml.as_bytes(), 0).unwrap();
    assert_eq!(header.filter_line.as_deref(), Some("FTMS + p & <ms>"));
}

#[test]
fn test_unsupported_precision() {
    let xml = r#"<scan num="3" msLevel="1" peaksCount="1"><peaks precision="16">AAAA</peaks></scan>"#;
    let err = ScanRecordDecoder::new(&LEGACY).read_scan(xml.as_bytes(), 0).unwrap_err();
    assert!(matches!(err, RecordError::InvalidValue { .. }));
}

#[test]
fn test_not_a_record() {
    let decoder = ScanRecordDecoder::new(&LEGACY);
    let err = decoder.read_header(&b"<peaks precision=\"32\">"[..], 0).unwrap_err();
    match err {
        RecordError::NotARecord { expected, found } => {
            assert_eq!(expected, "scan");
            assert_eq!(found, "<peaks>");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_modern_file_info() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<indexedmzML>
<mzML version="1.1.0">
  <fileDescription>
    <sourceFileList count="1">
      <sourceFile id="RAW1" name="sample.raw" location="file:///data/">
        <cvParam cvRef="MS" accession="MS:1000768" name="Thermo nativeID format"/>
        <cvParam cvRef="MS" accession="MS:1000563" name="Thermo RAW format"/>
        <cvParam cvRef="MS" accession="MS:1000569" name="SHA-1" value="da39a3ee5e6b4b0d3255bfef95601890afd80709"/>
      </sourceFile>
    </sourceFileList>
  </fileDescription>
  <softwareList count="1">
    <software id="pwiz" version="3.0">
      <cvParam cvRef="MS" accession="MS:1000615" name="ProteoWizard software"/>
    </software>
  </softwareList>
  <instrumentConfigurationList count="1">
    <instrumentConfiguration id="IC1">
      <cvParam cvRef="MS" accession="MS:1001742" name="LTQ Orbitrap Velos"/>
      <cvParam cvRef="MS" accession="MS:1000529" name="instrument serial number" value="SN1"/>
      <componentList count="3">
        <source order="1"><cvParam cvRef="MS" accession="MS:1000073" name="electrospray ionization"/></source>
        <analyzer order="2"><cvParam cvRef="MS" accession="MS:1000484" name="orbitrap"/></analyzer>
        <detector order="3"><cvParam cvRef="MS" accession="MS:1000624" name="inductive detector"/></detector>
      </componentList>
    </instrumentConfiguration>
  </instrumentConfigurationList>
  <run id="run_01" startTimeStamp="2024-01-01T10:00:00Z">
    <spectrumList count="42">
      <spectrum index="0" id="scan=1" defaultArrayLength="0"/>"#;

    let info = ScanRecordDecoder::new(&MODERN).read_file_info(xml.as_bytes()).unwrap();
    assert_eq!(info.dialect, Dialect::Modern);
    assert_eq!(info.declared_scan_count, Some(42));
    assert_eq!(info.run_id.as_deref(), Some("run_01"));
    assert_eq!(info.start_timestamp.as_deref(), Some("2024-01-01T10:00:00Z"));

    assert_eq!(info.parent_files.len(), 1);
    let parent = &info.parent_files[0];
    assert_eq!(parent.file_name, "file:///data/sample.raw");
    assert_eq!(parent.file_type.as_deref(), Some("Thermo RAW format"));
    assert_eq!(parent.sha1.as_deref(), Some("da39a3ee5e6b4b0d3255bfef95601890afd80709"));

    assert_eq!(info.software.len(), 1);
    assert_eq!(info.software[0].name, "ProteoWizard software");
    assert_eq!(info.software[0].version.as_deref(), Some("3.0"));

    assert_eq!(info.instrument.model.as_deref(), Some("LTQ Orbitrap Velos"));
    assert_eq!(info.instrument.ionisation.as_deref(), Some("electrospray ionization"));
    assert_eq!(info.instrument.mass_analyzer.as_deref(), Some("orbitrap"));
    assert_eq!(info.instrument.detector.as_deref(), Some("inductive detector"));
}

#[test]
fn test_legacy_file_info() {
    let xml = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<mzXML xmlns="http://sashimi.sourceforge.net/schema_revision/mzXML_3.2">
  <msRun scanCount="2" startTime="PT0.5S" endTime="PT120S">
    <parentFile fileName="file://C:/data/sample.raw" fileType="RAWData" fileSha1="abc123"/>
    <msInstrument>
      <msManufacturer category="msManufacturer" value="Thermo Scientific"/>
      <msModel category="msModel" value="Q Exactive"/>
      <msIonisation category="msIonisation" value="ESI"/>
      <msMassAnalyzer category="msMassAnalyzer" value="FTMS"/>
      <msDetector category="msDetector" value="unknown"/>
      <software type="acquisition" name="Xcalibur" version="2.2"/>
    </msInstrument>
    <dataProcessing centroided="1">
      <software type="conversion" name="ReAdW" version="4.3.1"/>
    </dataProcessing>
    <scan num="1" msLevel="1" peaksCount="0"/>"#;

    let info = ScanRecordDecoder::new(&LEGACY).read_file_info(xml.as_bytes()).unwrap();
    assert_eq!(info.dialect, Dialect::Legacy);
    assert_eq!(info.declared_scan_count, Some(2));
    assert_eq!(info.start_time, Some(0.5));
    assert_eq!(info.end_time, Some(120.0));
    assert_eq!(info.parent_files[0].file_type.as_deref(), Some("RAWData"));
    assert_eq!(info.parent_files[0].sha1.as_deref(), Some("abc123"));
    assert_eq!(info.instrument.manufacturer.as_deref(), Some("Thermo Scientific"));
    assert_eq!(info.instrument.model.as_deref(), Some("Q Exactive"));
    assert_eq!(info.instrument.mass_analyzer.as_deref(), Some("FTMS"));

    let names: Vec<_> = info.software.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Xcalibur", "ReAdW"]);
    assert_eq!(info.software[1].kind.as_deref(), Some("conversion"));
}

#[test]
fn test_record_key_from_opening_tag() {
    let legacy = ScanRecordDecoder::new(&LEGACY);
    let modern = ScanRecordDecoder::new(&MODERN);

    assert_eq!(legacy.read_record_key(br#"<scan num="12" msLevel="2">"#).unwrap(), 12);
    assert_eq!(
        modern
            .read_record_key(br#"<spectrum index="3" id="scan=40" defaultArrayLength="5">"#)
            .unwrap(),
        40
    );
    assert_eq!(
        modern
            .read_record_key(br#"<spectrum index="3" id="frame=2" defaultArrayLength="5">"#)
            .unwrap(),
        4
    );
    assert!(matches!(
        legacy.read_record_key(br#"<scan msLevel="2">"#),
        Err(RecordError::MissingScanNumber)
    ));
}
