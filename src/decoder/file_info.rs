use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::helpers::{get_attribute, parse_cv_param, CvParam};
use super::RecordError;
use crate::dialect::{cv, parse_duration_seconds, Dialect, DialectDescriptor, InfoElement};
use crate::models::{FileInfo, ParentFile, SoftwareInfo};

/// Read the file-level elements that precede the first record
pub(crate) fn read_file_info<R: BufRead>(
    descriptor: &'static DialectDescriptor,
    source: R,
) -> Result<FileInfo, RecordError> {
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut info = FileInfo::new(descriptor.dialect);
    // Info role of every open element, innermost last
    let mut stack: Vec<Option<InfoElement>> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.name();
                let name = std::str::from_utf8(name.as_ref())?;

                if name == descriptor.record_tag {
                    break;
                }

                if name == descriptor.record_count_tag {
                    info.declared_scan_count =
                        get_attribute(e, descriptor.record_count_attribute)?
                            .and_then(|v| v.trim().parse().ok());
                }

                let role = descriptor.info_element(name);
                if let Some(role) = role {
                    open_element(descriptor.dialect, role, e, &mut info)?;
                } else if descriptor.param_tag == Some(name) {
                    if let Some(role) = stack.iter().rev().find_map(|r| *r) {
                        apply_param(role, &parse_cv_param(e)?, &mut info);
                    }
                }

                if !is_empty {
                    stack.push(role);
                }
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    log::debug!(
        "{} file info: {} parent file(s), {} software entries, declared count {:?}",
        descriptor.dialect,
        info.parent_files.len(),
        info.software.len(),
        info.declared_scan_count
    );
    Ok(info)
}

fn attr(e: &BytesStart, name: &str) -> Result<Option<String>, quick_xml::Error> {
    Ok(get_attribute(e, name)?.filter(|v| !v.is_empty()))
}

fn open_element(
    dialect: Dialect,
    role: InfoElement,
    e: &BytesStart,
    info: &mut FileInfo,
) -> Result<(), RecordError> {
    match (dialect, role) {
        (Dialect::Legacy, InfoElement::Run) => {
            info.start_time = attr(e, "startTime")?.and_then(|v| parse_duration_seconds(&v));
            info.end_time = attr(e, "endTime")?.and_then(|v| parse_duration_seconds(&v));
        }
        (Dialect::Modern, InfoElement::Run) => {
            info.run_id = attr(e, "id")?;
            info.start_timestamp = attr(e, "startTimeStamp")?;
        }
        (_, InfoElement::RecordList) => {}
        (Dialect::Legacy, InfoElement::ParentFile) => {
            if let Some(file_name) = attr(e, "fileName")? {
                info.parent_files.push(ParentFile {
                    file_name,
                    file_type: attr(e, "fileType")?,
                    sha1: attr(e, "fileSha1")?,
                });
            }
        }
        (Dialect::Modern, InfoElement::ParentFile) => {
            let file_name = attr(e, "name")?.unwrap_or_default();
            let file_name = match attr(e, "location")? {
                Some(location) => format!("{}/{}", location.trim_end_matches('/'), file_name),
                None => file_name,
            };
            info.parent_files.push(ParentFile {
                file_name,
                ..Default::default()
            });
        }
        (Dialect::Legacy, InfoElement::Software) => {
            info.software.push(SoftwareInfo {
                kind: attr(e, "type")?,
                name: attr(e, "name")?.unwrap_or_default(),
                version: attr(e, "version")?,
            });
        }
        (Dialect::Modern, InfoElement::Software) => {
            info.software.push(SoftwareInfo {
                kind: None,
                name: attr(e, "id")?.unwrap_or_default(),
                version: attr(e, "version")?,
            });
        }
        (Dialect::Legacy, role) => {
            if let Some(value) = attr(e, "value")? {
                set_instrument(role, value, info);
            }
        }
        (Dialect::Modern, _) => {}
    }
    Ok(())
}

/// Apply a parameter to the innermost file-level element
fn apply_param(role: InfoElement, param: &CvParam, info: &mut FileInfo) {
    match role {
        InfoElement::ParentFile => {
            let Some(parent) = info.parent_files.last_mut() else {
                return;
            };
            if param.accession == cv::SHA1_CHECKSUM {
                parent.sha1 = param.value.clone();
            } else if parent.file_type.is_none() && !param.name.contains("nativeID") {
                parent.file_type = Some(param.name.clone());
            }
        }
        InfoElement::Software => {
            if let Some(software) = info.software.last_mut() {
                if param.value.is_none() && !param.name.is_empty() {
                    software.name = param.name.clone();
                }
            }
        }
        InfoElement::Model
        | InfoElement::Ionisation
        | InfoElement::Analyzer
        | InfoElement::Detector => {
            // Valued terms are properties like serial numbers, not names
            if param.value.is_none() && !param.name.is_empty() {
                set_instrument(role, param.name.clone(), info);
            }
        }
        InfoElement::Run | InfoElement::RecordList | InfoElement::Manufacturer => {}
    }
}

/// Set an instrument field, keeping the first value seen
fn set_instrument(role: InfoElement, value: String, info: &mut FileInfo) {
    let instrument = &mut info.instrument;
    let slot = match role {
        InfoElement::Manufacturer => &mut instrument.manufacturer,
        InfoElement::Model => &mut instrument.model,
        InfoElement::Ionisation => &mut instrument.ionisation,
        InfoElement::Analyzer => &mut instrument.mass_analyzer,
        InfoElement::Detector => &mut instrument.detector,
        _ => return,
    };
    slot.get_or_insert(value);
}
