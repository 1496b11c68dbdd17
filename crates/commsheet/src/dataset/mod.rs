//! Static dataset loading.
//!
//! Two read-only datasets ship with the application: the master call library
//! and the airport directory. Both loaders normalize dataset-native field
//! names into the engine vocabulary and degrade to a default on any failure
//! rather than erroring the caller.

pub mod airports;

use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::call::{CallKind, ContextTag, MasterCall};
use crate::error::{Error, Result};

pub use airports::{Airport, AirportDirectory};

/// The master dataset file: `{ "calls": [...] }` with dataset-native field
/// names.
#[derive(Debug, Deserialize)]
struct MasterFile {
    calls: Vec<MasterCallRaw>,
}

/// A raw master call record as it appears in the dataset file.
#[derive(Debug, Deserialize)]
struct MasterCallRaw {
    call_id: String,
    block: String,
    #[serde(default)]
    group: Option<String>,
    sequence: f64,
    comm_type: String,
    text: String,
    #[serde(default)]
    applies_to: Vec<String>,
    // Present in the dataset but not consumed by the engine.
    #[serde(default)]
    #[allow(dead_code)]
    expand_per_runway: bool,
}

/// The loaded, normalized master call library.
///
/// Constructed once at startup and treated as read-only for the session.
#[derive(Debug, Clone, Default)]
pub struct MasterLibrary {
    calls: Vec<MasterCall>,
}

impl MasterLibrary {
    /// Load the master library from a JSON dataset file.
    ///
    /// Any failure degrades to an empty library with a warning; the caller
    /// never sees an error.
    #[must_use]
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path.as_ref()) {
            Ok(library) => library,
            Err(err) => {
                warn!("failed to load master call library, using empty: {err}");
                Self::default()
            }
        }
    }

    /// Load the master library, surfacing failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the dataset file cannot be read or parsed.
    pub fn try_load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::DatasetRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: MasterFile =
            serde_json::from_str(&raw).map_err(|source| Error::DatasetParse {
                path: path.to_path_buf(),
                source,
            })?;

        let library = Self::from_raw(file.calls);
        debug!("loaded {} master calls from {}", library.len(), path.display());
        Ok(library)
    }

    /// Build a library from already-normalized calls (fixtures, tests).
    #[must_use]
    pub fn from_calls(calls: Vec<MasterCall>) -> Self {
        Self { calls }
    }

    fn from_raw(raw: Vec<MasterCallRaw>) -> Self {
        let var_re = Regex::new(r"\{\{(\w+)\}\}").expect("valid template-variable pattern");
        let calls = raw
            .into_iter()
            .map(|record| normalize_call(record, &var_re))
            .collect();
        Self { calls }
    }

    /// The normalized calls, in dataset order.
    #[must_use]
    pub fn calls(&self) -> &[MasterCall] {
        &self.calls
    }

    /// Look up a master call by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MasterCall> {
        self.calls.iter().find(|c| c.id == id)
    }

    /// Number of calls in the library.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check whether the library is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Map a dataset-native `comm_type` to the engine vocabulary.
fn normalize_kind(comm_type: &str) -> CallKind {
    match comm_type {
        "radio" => CallKind::Radio,
        "atc_response" | "atc" => CallKind::Atc,
        "ics" | "note" => CallKind::Note,
        "brief" => CallKind::Brief,
        other => {
            warn!("unknown comm_type {other:?}, treating as note");
            CallKind::Note
        }
    }
}

/// Map a dataset-native applicability tag to the engine vocabulary.
///
/// Accepts both the long dataset form (`vfr_nontowered`) and the engine's
/// short form, dropping anything else.
fn normalize_tag(tag: &str) -> Option<ContextTag> {
    match tag {
        "vfr_nontowered" => Some(ContextTag::VfrNt),
        "vfr_towered" => Some(ContextTag::VfrT),
        "ifr_nontowered" => Some(ContextTag::IfrNt),
        "ifr_towered" => Some(ContextTag::IfrT),
        other => {
            let parsed = ContextTag::parse(other);
            if parsed.is_none() {
                warn!("dropping unknown applies_to tag {other:?}");
            }
            parsed
        }
    }
}

/// Map dataset-native template variable names to engine variable names.
fn normalize_variable(name: &str) -> Option<&'static str> {
    match name {
        "Call_Sign_Full" => Some("CS_Full"),
        "Call_Sign_Abbr" => Some("CS_Abbr"),
        "Stop1_Airport_Name" => Some("Dep_Name"),
        "Stop1_Airport_Abridged" => Some("Dep_Abridged"),
        "Stop1_Airport_Traffic" => Some("Dep_Traffic"),
        "Stop2_Airport_Name" => Some("Arr_Name"),
        "Stop2_Airport_Abridged" => Some("Arr_Abridged"),
        "Stop2_Airport_Traffic" => Some("Arr_Traffic"),
        _ => None,
    }
}

/// Rewrite `{{Var}}` tokens from dataset-native to engine variable names,
/// leaving unknown tokens untouched.
fn remap_variables(text: &str, var_re: &Regex) -> String {
    var_re
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match normalize_variable(name) {
                Some(mapped) => format!("{{{{{mapped}}}}}"),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn normalize_call(raw: MasterCallRaw, var_re: &Regex) -> MasterCall {
    MasterCall {
        id: raw.call_id,
        block: raw.block,
        group: raw.group,
        seq: raw.sequence,
        kind: normalize_kind(&raw.comm_type),
        text: remap_variables(&raw.text, var_re),
        applies: raw
            .applies_to
            .iter()
            .filter_map(|tag| normalize_tag(tag))
            .collect(),
    }
}
