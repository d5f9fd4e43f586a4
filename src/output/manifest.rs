//! Event manifest
//!
//! XML record of the scheduled events, read by the scoring side:
//!
//! ```xml
//! <event_output>
//!     <event_option>
//!         <minutes_before_event_start>2</minutes_before_event_start>
//!         <event_duration>20</event_duration>
//!     </event_option>
//!     <events>
//!         <event id="NEPAL">
//!             <delay_to_pre_event>5</delay_to_pre_event>
//!             <start_epoch>946685220</start_epoch>
//!             <terms>nepal, earthquake, quake</terms>
//!             <start_string>Sat Jan 01 00:07:00 GMT 2000</start_string>
//!         </event>
//!     </events>
//! </event_output>
//! ```

use crate::events::ManifestEntry;
use crate::output::error::{OutputError, OutputResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

/// Scheduled events of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventManifest {
    pub minutes_before_event_start: u32,
    pub event_duration: u32,
    pub events: Vec<ManifestEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename = "event_output")]
struct EventOutput {
    event_option: EventOption,
    events: EventList,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventOption {
    minutes_before_event_start: u32,
    event_duration: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EventList {
    #[serde(default)]
    event: Vec<ManifestEntry>,
}

impl EventManifest {
    pub fn new(minutes_before_event_start: u32, event_duration: u32, events: Vec<ManifestEntry>) -> Self {
        Self {
            minutes_before_event_start,
            event_duration,
            events,
        }
    }

    /// Manifest path for a run at `scale_percent`
    pub fn path_in(dir: &Path, scale_percent: u32) -> PathBuf {
        dir.join(format!("events_{}.xml", scale_percent))
    }

    pub fn to_xml(&self) -> OutputResult<String> {
        let document = EventOutput {
            event_option: EventOption {
                minutes_before_event_start: self.minutes_before_event_start,
                event_duration: self.event_duration,
            },
            events: EventList {
                event: self.events.clone(),
            },
        };

        let mut body = String::new();
        let mut serializer = quick_xml::se::Serializer::new(&mut body);
        serializer.indent(' ', 4);
        document
            .serialize(serializer)
            .map_err(|e| OutputError::Xml(e.to_string()))?;

        Ok(format!("{}\n{}\n", XML_DECLARATION, body))
    }

    pub fn from_xml(xml: &str) -> OutputResult<Self> {
        let document: EventOutput = quick_xml::de::from_str(xml).map_err(|e| OutputError::Xml(e.to_string()))?;
        Ok(Self {
            minutes_before_event_start: document.event_option.minutes_before_event_start,
            event_duration: document.event_option.event_duration,
            events: document.events.event,
        })
    }

    pub fn write(&self, path: &Path) -> OutputResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_xml()?)?;
        tracing::info!(path = ?path, events = self.events.len(), "Wrote event manifest");
        Ok(())
    }

    pub fn read(path: &Path) -> OutputResult<Self> {
        Self::from_xml(&std::fs::read_to_string(path)?)
    }
}
