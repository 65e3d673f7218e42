//! Synthetic scan file generator shared by the integration tests
#![allow(dead_code)]

use std::io::Write;

use base64::prelude::*;
use flate2::write::ZlibEncoder;
use mzscan::dialect::Dialect;
use tempfile::NamedTempFile;

/// How the generated file ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footer {
    /// Correct index block and footer
    Valid,
    /// No index block and no footer
    Absent,
    /// Footer element with a non-numeric value
    Garbage,
    /// Footer pointing past the end of the file
    PastEnd,
    /// Footer pointing at the first record instead of the index
    WrongTarget,
    /// Index whose offsets are shifted off the records
    Stale,
    /// Index with one shifted entry in the middle of the file
    StaleEntry,
}

/// How legacy scans store their peaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyPeaks {
    /// One network-order element of interleaved pairs with `pairOrder`
    Interleaved,
    /// Separate m/z and intensity elements with `contentType`, no `byteOrder`
    TypedArrays,
    /// Two elements without content or byte-order declarations
    UntypedArrays,
}

/// One scan to write
#[derive(Debug, Clone)]
pub struct TestScan {
    pub number: u32,
    pub ms_level: u8,
    pub retention_time: f64,
    pub masses: Vec<f64>,
    pub intensities: Vec<f64>,
    pub precursor_mz: Option<f64>,
}

impl TestScan {
    pub fn new(number: u32, ms_level: u8, retention_time: f64, peaks: &[(f64, f64)]) -> Self {
        Self {
            number,
            ms_level,
            retention_time,
            masses: peaks.iter().map(|p| p.0).collect(),
            intensities: peaks.iter().map(|p| p.1).collect(),
            precursor_mz: None,
        }
    }

    pub fn with_precursor(mut self, mz: f64) -> Self {
        self.precursor_mz = Some(mz);
        self
    }

    fn low_mz(&self) -> f64 {
        self.masses.iter().copied().fold(f64::INFINITY, f64::min)
    }

    fn high_mz(&self) -> f64 {
        self.masses.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    fn tic(&self) -> f64 {
        self.intensities.iter().sum()
    }
}

/// A generated file plus the ground truth needed to check readers
#[derive(Debug, Clone)]
pub struct Generated {
    pub dialect: Dialect,
    pub text: String,
    /// Scan number and record offset, in file order
    pub offsets: Vec<(u32, u64)>,
    /// Offset of the index block, when one was written
    pub index_offset: Option<u64>,
}

impl Generated {
    /// Write to a temporary file with the dialect's extension
    pub fn write(&self) -> NamedTempFile {
        let suffix = match self.dialect {
            Dialect::Legacy => ".mzXML",
            Dialect::Modern => ".mzML",
        };
        write_temp(self.text.as_bytes(), suffix)
    }

    pub fn offset_of(&self, scan_number: u32) -> Option<u64> {
        self.offsets
            .iter()
            .find(|(n, _)| *n == scan_number)
            .map(|(_, offset)| *offset)
    }
}

pub fn write_temp(bytes: &[u8], suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Builder for synthetic mzXML/mzML documents
#[derive(Debug, Clone)]
pub struct FileBuilder {
    dialect: Dialect,
    scans: Vec<TestScan>,
    double_precision: bool,
    zlib: bool,
    nested: bool,
    footer: Footer,
    truncated_scan: Option<u32>,
    legacy_peaks: LegacyPeaks,
}

impl FileBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            scans: Vec::new(),
            double_precision: false,
            zlib: false,
            nested: false,
            footer: Footer::Valid,
            truncated_scan: None,
            legacy_peaks: LegacyPeaks::Interleaved,
        }
    }

    pub fn scan(mut self, scan: TestScan) -> Self {
        self.scans.push(scan);
        self
    }

    pub fn double_precision(mut self) -> Self {
        self.double_precision = true;
        self
    }

    pub fn zlib(mut self) -> Self {
        self.zlib = true;
        self
    }

    /// Nest MS2+ scans inside the preceding MS1 scan (legacy only)
    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    pub fn footer(mut self, footer: Footer) -> Self {
        self.footer = footer;
        self
    }

    pub fn legacy_peaks(mut self, layout: LegacyPeaks) -> Self {
        self.legacy_peaks = layout;
        self
    }

    /// Drop the last byte of a scan's intensity bytes before encoding
    pub fn truncate_intensities(mut self, scan_number: u32) -> Self {
        self.truncated_scan = Some(scan_number);
        self
    }

    pub fn build(&self) -> Generated {
        match self.dialect {
            Dialect::Legacy => self.build_legacy(),
            Dialect::Modern => self.build_modern(),
        }
    }

    fn precision(&self) -> u8 {
        if self.double_precision {
            64
        } else {
            32
        }
    }

    fn encode_values(&self, values: &[f64], big_endian: bool, truncate: bool) -> String {
        let mut bytes = Vec::new();
        for v in values {
            match (self.double_precision, big_endian) {
                (true, true) => bytes.extend_from_slice(&v.to_be_bytes()),
                (true, false) => bytes.extend_from_slice(&v.to_le_bytes()),
                (false, true) => bytes.extend_from_slice(&(*v as f32).to_be_bytes()),
                (false, false) => bytes.extend_from_slice(&(*v as f32).to_le_bytes()),
            }
        }
        if truncate {
            bytes.pop();
        }
        if self.zlib {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&bytes).unwrap();
            bytes = encoder.finish().unwrap();
        }
        BASE64_STANDARD.encode(bytes)
    }

    fn build_legacy(&self) -> Generated {
        let first_rt = self.scans.first().map_or(0.0, |s| s.retention_time);
        let last_rt = self.scans.last().map_or(0.0, |s| s.retention_time);
        let mut doc = format!(
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n\
             <mzXML xmlns=\"http://sashimi.sourceforge.net/schema_revision/mzXML_3.2\">\n \
             <msRun scanCount=\"{}\" startTime=\"PT{first_rt}S\" endTime=\"PT{last_rt}S\">\n  \
             <parentFile fileName=\"file:///data/sample.raw\" fileType=\"RAWData\" fileSha1=\"0123456789abcdef\"/>\n  \
             <msInstrument>\n   \
             <msManufacturer category=\"msManufacturer\" value=\"Thermo Scientific\"/>\n   \
             <msModel category=\"msModel\" value=\"LTQ Orbitrap\"/>\n   \
             <msIonisation category=\"msIonisation\" value=\"ESI\"/>\n   \
             <msMassAnalyzer category=\"msMassAnalyzer\" value=\"FTMS\"/>\n   \
             <msDetector category=\"msDetector\" value=\"unknown\"/>\n  \
             </msInstrument>\n  \
             <dataProcessing centroided=\"1\">\n   \
             <software type=\"conversion\" name=\"ProteoWizard\" version=\"3.0.1\"/>\n  \
             </dataProcessing>\n",
            self.scans.len()
        );

        let mut offsets = Vec::new();
        let mut parent_open = false;
        for scan in &self.scans {
            if self.nested && scan.ms_level == 1 && parent_open {
                doc.push_str("  </scan>\n");
                parent_open = false;
            }
            let indent = if self.nested && scan.ms_level > 1 && parent_open {
                "    "
            } else {
                "  "
            };
            doc.push_str(indent);
            offsets.push((scan.number, doc.len() as u64));

            let pairs: Vec<f64> = scan
                .masses
                .iter()
                .zip(&scan.intensities)
                .flat_map(|(mz, i)| [*mz, *i])
                .collect();
            let compression = if self.zlib { "zlib" } else { "none" };
            let range = if scan.masses.is_empty() {
                String::new()
            } else {
                format!(" lowMz=\"{}\" highMz=\"{}\"", scan.low_mz(), scan.high_mz())
            };
            doc.push_str(&format!(
                "<scan num=\"{}\"\n{indent}      msLevel=\"{}\" peaksCount=\"{}\" polarity=\"+\" \
                 retentionTime=\"PT{}S\"{range} totIonCurrent=\"{}\">\n",
                scan.number,
                scan.ms_level,
                scan.masses.len(),
                scan.retention_time,
                scan.tic()
            ));
            if let Some(mz) = scan.precursor_mz {
                doc.push_str(&format!(
                    "{indent}  <precursorMz precursorIntensity=\"1000\" precursorCharge=\"2\" activationMethod=\"CID\">{mz}</precursorMz>\n"
                ));
            }
            let truncate = self.truncated_scan == Some(scan.number);
            let precision = self.precision();
            match self.legacy_peaks {
                LegacyPeaks::Interleaved => doc.push_str(&format!(
                    "{indent}  <peaks precision=\"{precision}\" byteOrder=\"network\" pairOrder=\"m/z-int\" compressionType=\"{compression}\">{}</peaks>\n",
                    self.encode_values(&pairs, true, truncate)
                )),
                LegacyPeaks::TypedArrays | LegacyPeaks::UntypedArrays => {
                    let typed = self.legacy_peaks == LegacyPeaks::TypedArrays;
                    let arrays = [
                        ("m/z", self.encode_values(&scan.masses, false, false)),
                        ("intensity", self.encode_values(&scan.intensities, false, truncate)),
                    ];
                    for (content, payload) in arrays {
                        let content = if typed {
                            format!(" contentType=\"{content}\"")
                        } else {
                            String::new()
                        };
                        doc.push_str(&format!(
                            "{indent}  <peaks precision=\"{precision}\" compressionType=\"{compression}\"{content}>{payload}</peaks>\n"
                        ));
                    }
                }
            }

            if self.nested && scan.ms_level == 1 {
                parent_open = true;
            } else {
                doc.push_str(indent);
                doc.push_str("</scan>\n");
            }
        }
        if parent_open {
            doc.push_str("  </scan>\n");
        }
        doc.push_str(" </msRun>\n");

        let index_offset = self.write_index(&mut doc, &offsets, |doc, offsets| {
            doc.push_str(" <index name=\"scan\">\n");
            for (num, offset) in offsets {
                doc.push_str(&format!("  <offset id=\"{num}\">{offset}</offset>\n"));
            }
            doc.push_str(" </index>\n");
        });
        doc.push_str("</mzXML>\n");

        Generated {
            dialect: Dialect::Legacy,
            text: doc,
            offsets,
            index_offset,
        }
    }

    fn build_modern(&self) -> Generated {
        let indexed = self.footer != Footer::Absent;
        let mut doc = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        if indexed {
            doc.push_str("<indexedmzML xmlns=\"http://psi.hupo.org/ms/mzml\">\n");
        }
        doc.push_str(&format!(
            "<mzML xmlns=\"http://psi.hupo.org/ms/mzml\" version=\"1.1.0\">\n  \
             <fileDescription>\n    \
             <fileContent>\n      \
             <cvParam cvRef=\"MS\" accession=\"MS:1000579\" name=\"MS1 spectrum\" value=\"\"/>\n    \
             </fileContent>\n    \
             <sourceFileList count=\"1\">\n      \
             <sourceFile id=\"RAW1\" name=\"sample.raw\" location=\"file:///data\">\n        \
             <cvParam cvRef=\"MS\" accession=\"MS:1000768\" name=\"Thermo nativeID format\" value=\"\"/>\n        \
             <cvParam cvRef=\"MS\" accession=\"MS:1000563\" name=\"Thermo RAW format\" value=\"\"/>\n        \
             <cvParam cvRef=\"MS\" accession=\"MS:1000569\" name=\"SHA-1\" value=\"0123456789abcdef\"/>\n      \
             </sourceFile>\n    \
             </sourceFileList>\n  \
             </fileDescription>\n  \
             <softwareList count=\"1\">\n    \
             <software id=\"pwiz\" version=\"3.0.1\">\n      \
             <cvParam cvRef=\"MS\" accession=\"MS:1000615\" name=\"ProteoWizard software\" value=\"\"/>\n    \
             </software>\n  \
             </softwareList>\n  \
             <instrumentConfigurationList count=\"1\">\n    \
             <instrumentConfiguration id=\"IC1\">\n      \
             <cvParam cvRef=\"MS\" accession=\"MS:1001742\" name=\"LTQ Orbitrap Velos\" value=\"\"/>\n      \
             <componentList count=\"3\">\n        \
             <source order=\"1\"><cvParam cvRef=\"MS\" accession=\"MS:1000073\" name=\"electrospray ionization\" value=\"\"/></source>\n        \
             <analyzer order=\"2\"><cvParam cvRef=\"MS\" accession=\"MS:1000484\" name=\"orbitrap\" value=\"\"/></analyzer>\n        \
             <detector order=\"3\"><cvParam cvRef=\"MS\" accession=\"MS:1000624\" name=\"inductive detector\" value=\"\"/></detector>\n      \
             </componentList>\n    \
             </instrumentConfiguration>\n  \
             </instrumentConfigurationList>\n  \
             <run id=\"sample\" defaultInstrumentConfigurationRef=\"IC1\" startTimeStamp=\"2024-01-15T10:30:00Z\">\n    \
             <spectrumList count=\"{}\" defaultDataProcessingRef=\"pwiz\">\n",
            self.scans.len()
        ));

        let mut offsets = Vec::new();
        let compression = if self.zlib {
            "<cvParam cvRef=\"MS\" accession=\"MS:1000574\" name=\"zlib compression\" value=\"\"/>"
        } else {
            "<cvParam cvRef=\"MS\" accession=\"MS:1000576\" name=\"no compression\" value=\"\"/>"
        };
        let precision = if self.double_precision {
            "<cvParam cvRef=\"MS\" accession=\"MS:1000523\" name=\"64-bit float\" value=\"\"/>"
        } else {
            "<cvParam cvRef=\"MS\" accession=\"MS:1000521\" name=\"32-bit float\" value=\"\"/>"
        };

        for (index, scan) in self.scans.iter().enumerate() {
            let window = if scan.masses.is_empty() {
                String::new()
            } else {
                format!(
                    "            <scanWindowList count=\"1\">\n              \
                     <scanWindow>\n                \
                     <cvParam cvRef=\"MS\" accession=\"MS:1000501\" name=\"scan window lower limit\" value=\"{}\"/>\n                \
                     <cvParam cvRef=\"MS\" accession=\"MS:1000500\" name=\"scan window upper limit\" value=\"{}\"/>\n              \
                     </scanWindow>\n            \
                     </scanWindowList>\n",
                    scan.low_mz(),
                    scan.high_mz()
                )
            };
            doc.push_str("      ");
            offsets.push((scan.number, doc.len() as u64));
            doc.push_str(&format!(
                "<spectrum index=\"{index}\" id=\"controllerType=0 controllerNumber=1 scan={}\" defaultArrayLength=\"{}\">\n        \
                 <cvParam cvRef=\"MS\" accession=\"MS:1000511\" name=\"ms level\" value=\"{}\"/>\n        \
                 <cvParam cvRef=\"MS\" accession=\"MS:1000130\" name=\"positive scan\" value=\"\"/>\n        \
                 <cvParam cvRef=\"MS\" accession=\"MS:1000127\" name=\"centroid spectrum\" value=\"\"/>\n        \
                 <cvParam cvRef=\"MS\" accession=\"MS:1000285\" name=\"total ion current\" value=\"{}\"/>\n        \
                 <scanList count=\"1\">\n          \
                 <scan instrumentConfigurationRef=\"IC1\">\n            \
                 <cvParam cvRef=\"MS\" accession=\"MS:1000016\" name=\"scan start time\" value=\"{}\" unitCvRef=\"UO\" unitAccession=\"UO:0000031\" unitName=\"minute\"/>\n\
                 {window}          \
                 </scan>\n        \
                 </scanList>\n",
                scan.number,
                scan.masses.len(),
                scan.ms_level,
                scan.tic(),
                scan.retention_time / 60.0,
            ));
            if let Some(mz) = scan.precursor_mz {
                doc.push_str(&format!(
                    "        <precursorList count=\"1\">\n          <precursor>\n            \
                     <selectedIonList count=\"1\">\n              <selectedIon>\n                \
                     <cvParam cvRef=\"MS\" accession=\"MS:1000744\" name=\"selected ion m/z\" value=\"{mz}\"/>\n                \
                     <cvParam cvRef=\"MS\" accession=\"MS:1000041\" name=\"charge state\" value=\"2\"/>\n              \
                     </selectedIon>\n            </selectedIonList>\n            \
                     <activation>\n              \
                     <cvParam cvRef=\"MS\" accession=\"MS:1000133\" name=\"collision-induced dissociation\" value=\"\"/>\n            \
                     </activation>\n          </precursor>\n        </precursorList>\n"
                ));
            }
            let masses = self.encode_values(&scan.masses, false, false);
            let intensities = self.encode_values(
                &scan.intensities,
                false,
                self.truncated_scan == Some(scan.number),
            );
            doc.push_str(&format!(
                "        <binaryDataArrayList count=\"2\">\n          \
                 <binaryDataArray encodedLength=\"{}\">\n            \
                 {precision}\n            {compression}\n            \
                 <cvParam cvRef=\"MS\" accession=\"MS:1000514\" name=\"m/z array\" value=\"\" unitCvRef=\"MS\" unitAccession=\"MS:1000040\" unitName=\"m/z\"/>\n            \
                 <binary>{masses}</binary>\n          \
                 </binaryDataArray>\n          \
                 <binaryDataArray encodedLength=\"{}\">\n            \
                 {precision}\n            {compression}\n            \
                 <cvParam cvRef=\"MS\" accession=\"MS:1000515\" name=\"intensity array\" value=\"\" unitCvRef=\"MS\" unitAccession=\"MS:1000131\" unitName=\"number of detector counts\"/>\n            \
                 <binary>{intensities}</binary>\n          \
                 </binaryDataArray>\n        \
                 </binaryDataArrayList>\n      \
                 </spectrum>\n",
                masses.len(),
                intensities.len(),
            ));
        }
        doc.push_str("    </spectrumList>\n    <chromatogramList count=\"1\">\n      ");
        let chromatogram = doc.len() as u64;
        doc.push_str(
            "<chromatogram index=\"0\" id=\"TIC\" defaultArrayLength=\"0\">\n        \
             <binaryDataArrayList count=\"0\"/>\n      \
             </chromatogram>\n    \
             </chromatogramList>\n  \
             </run>\n\
             </mzML>\n",
        );

        let index_offset = self.write_index(&mut doc, &offsets, |doc, offsets| {
            doc.push_str("<indexList count=\"2\">\n  <index name=\"spectrum\">\n");
            for (num, offset) in offsets {
                doc.push_str(&format!(
                    "    <offset idRef=\"controllerType=0 controllerNumber=1 scan={num}\">{offset}</offset>\n"
                ));
            }
            doc.push_str(&format!(
                "  </index>\n  <index name=\"chromatogram\">\n    \
                 <offset idRef=\"TIC\">{chromatogram}</offset>\n  </index>\n</indexList>\n"
            ));
        });
        if indexed {
            doc.push_str("</indexedmzML>\n");
        }

        Generated {
            dialect: Dialect::Modern,
            text: doc,
            offsets,
            index_offset,
        }
    }

    /// Append the index block and footer as `self.footer` dictates
    fn write_index(
        &self,
        doc: &mut String,
        offsets: &[(u32, u64)],
        write_block: impl Fn(&mut String, &[(u32, u64)]),
    ) -> Option<u64> {
        if self.footer == Footer::Absent {
            return None;
        }

        let index_offset = doc.len() as u64;
        let listed: Vec<(u32, u64)> = match self.footer {
            Footer::Stale => offsets.iter().map(|(n, o)| (*n, o + 5)).collect(),
            Footer::StaleEntry => {
                let middle = offsets.len() / 2;
                offsets
                    .iter()
                    .enumerate()
                    .map(|(i, (n, o))| if i == middle { (*n, o + 5) } else { (*n, *o) })
                    .collect()
            }
            _ => offsets.to_vec(),
        };
        write_block(doc, &listed);

        let tag = match self.dialect {
            Dialect::Legacy => "indexOffset",
            Dialect::Modern => "indexListOffset",
        };
        let value = match self.footer {
            Footer::Garbage => "12ab".to_string(),
            Footer::PastEnd => "99999999".to_string(),
            Footer::WrongTarget => offsets.first().map_or(0, |(_, o)| *o).to_string(),
            _ => index_offset.to_string(),
        };
        doc.push_str(&format!("<{tag}>{value}</{tag}>\n"));
        match self.dialect {
            Dialect::Legacy => doc.push_str("<sha1>0000000000000000000000000000000000000000</sha1>\n"),
            Dialect::Modern => doc.push_str("<fileChecksum>0000000000000000000000000000000000000000</fileChecksum>\n"),
        }
        Some(index_offset)
    }
}

/// Two-scan legacy file: scan 1 has peaks (100, 10) and (101, 5), scan 2 none
pub fn two_scan_legacy() -> FileBuilder {
    FileBuilder::new(Dialect::Legacy)
        .scan(TestScan::new(1, 1, 1.5, &[(100.0, 10.0), (101.0, 5.0)]))
        .scan(TestScan::new(2, 2, 2.5, &[]).with_precursor(445.5))
}

/// Alternating MS1/MS2 run with `cycles` cycles of one MS1 and two MS2 scans
pub fn lcms_run(dialect: Dialect, cycles: u32) -> FileBuilder {
    let mut builder = FileBuilder::new(dialect);
    let mut number = 1;
    for cycle in 0..cycles {
        let rt = f64::from(cycle) * 3.0;
        let peaks: Vec<(f64, f64)> = (0..8)
            .map(|j| (200.0 + f64::from(j) * 25.0 + f64::from(cycle), 1000.0 + f64::from(j) * 10.0))
            .collect();
        builder = builder.scan(TestScan::new(number, 1, rt, &peaks));
        number += 1;
        for k in 0..2u32 {
            let fragments: Vec<(f64, f64)> = (0..4)
                .map(|j| (100.0 + f64::from(j) * 50.0, 500.0 - f64::from(j) * 25.0))
                .collect();
            builder = builder.scan(
                TestScan::new(number, 2, rt + 1.0 + f64::from(k), &fragments)
                    .with_precursor(400.0 + f64::from(k) * 50.0),
            );
            number += 1;
        }
    }
    builder
}
