//! Assembly of the combined findings document
//!
//! Issue and hotspot fragments arrive as raw JSON text. They are spliced into
//! `{"issues":[...],"hotspots":[...]}` by plain string concatenation, then the whole
//! document is parsed once and pretty-printed so the output is stable regardless of how
//! the service formatted each fragment. Object key order inside fragments is preserved
//! (`serde_json` is built with `preserve_order`) and numbers keep their exact text
//! (`arbitrary_precision`), so a 30-digit effort or `1.00` comes out as it went in.

use log::debug;
use serde_json::Value;
use serde_json::value::RawValue;

use crate::SonarError;
use crate::paging::PageEnvelope;

/// A piece of JSON text that should be spliced into the document as-is.
pub trait JsonFragment {
    /// The JSON text of this fragment.
    fn as_json(&self) -> &str;
}

impl JsonFragment for RawValue {
    fn as_json(&self) -> &str {
        self.get()
    }
}

impl JsonFragment for str {
    fn as_json(&self) -> &str {
        self
    }
}

impl JsonFragment for String {
    fn as_json(&self) -> &str {
        self
    }
}

impl<T: JsonFragment + ?Sized> JsonFragment for Box<T> {
    fn as_json(&self) -> &str {
        (**self).as_json()
    }
}

impl<T: JsonFragment + ?Sized> JsonFragment for &T {
    fn as_json(&self) -> &str {
        (**self).as_json()
    }
}

/// Build the pretty-printed `{"issues":[...],"hotspots":[...]}` document.
///
/// Every fragment must be exactly one JSON value. A fragment that is malformed, or that
/// would smuggle extra elements or keys into the document (`1,2`, `{}],"x":[`), fails the
/// whole call; no partial document is ever returned.
///
/// # Errors
///
/// Returns [`SonarError::InvalidFragment`] naming the first bad fragment, or
/// [`SonarError::Aggregation`] if the spliced document cannot be parsed or printed.
pub fn build_document<I, H>(issues: &[I], hotspots: &[H]) -> Result<String, SonarError>
where
    I: JsonFragment,
    H: JsonFragment,
{
    validate_fragments("issues", issues)?;
    validate_fragments("hotspots", hotspots)?;

    let spliced = splice(issues, hotspots);
    let document: Value = serde_json::from_str(&spliced).map_err(SonarError::Aggregation)?;

    let issue_count = array_len(&document, "issues");
    let hotspot_count = array_len(&document, "hotspots");
    let key_count = document.as_object().map_or(0, |map| map.len());
    if key_count != 2 || issue_count != Some(issues.len()) || hotspot_count != Some(hotspots.len())
    {
        return Err(SonarError::InvalidResponse(format!(
            "Assembled document has unexpected shape: {key_count} keys, {issue_count:?} issues \
             (expected {}), {hotspot_count:?} hotspots (expected {})",
            issues.len(),
            hotspots.len()
        )));
    }

    debug!(
        "Assembled findings document with {} issues and {} hotspots",
        issues.len(),
        hotspots.len()
    );

    serde_json::to_string_pretty(&document).map_err(SonarError::Aggregation)
}

fn validate_fragments<F: JsonFragment>(
    field: &'static str,
    fragments: &[F],
) -> Result<(), SonarError> {
    for (index, fragment) in fragments.iter().enumerate() {
        serde_json::from_str::<&RawValue>(fragment.as_json())
            .map_err(|source| SonarError::InvalidFragment {
                field,
                index,
                source,
            })?;
    }
    Ok(())
}

fn splice<I: JsonFragment, H: JsonFragment>(issues: &[I], hotspots: &[H]) -> String {
    let fragment_bytes: usize = issues
        .iter()
        .map(|f| f.as_json().len())
        .chain(hotspots.iter().map(|f| f.as_json().len()))
        .sum();
    let mut spliced = String::with_capacity(
        fragment_bytes
            .saturating_add(issues.len())
            .saturating_add(hotspots.len())
            .saturating_add(32),
    );

    spliced.push_str("{\"issues\":[");
    join_into(&mut spliced, issues);
    spliced.push_str("],\"hotspots\":[");
    join_into(&mut spliced, hotspots);
    spliced.push_str("]}");
    spliced
}

fn join_into<F: JsonFragment>(out: &mut String, fragments: &[F]) {
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(fragment.as_json());
    }
}

fn array_len(document: &Value, key: &str) -> Option<usize> {
    document.get(key).and_then(Value::as_array).map(Vec::len)
}

/// Append-only collector for the two result sets of a snapshot run.
#[derive(Debug, Default)]
pub struct FindingsAccumulator {
    issues: Vec<Box<RawValue>>,
    hotspots: Vec<Box<RawValue>>,
}

impl FindingsAccumulator {
    /// Create an empty accumulator
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append issue fragments in order.
    pub fn extend_issues(&mut self, fragments: impl IntoIterator<Item = Box<RawValue>>) {
        self.issues.extend(fragments);
    }

    /// Append hotspot fragments in order.
    pub fn extend_hotspots(&mut self, fragments: impl IntoIterator<Item = Box<RawValue>>) {
        self.hotspots.extend(fragments);
    }

    /// Move the issue fragments of a page into this accumulator.
    pub fn add_issues_page(&mut self, mut page: PageEnvelope) {
        self.extend_issues(page.take_issues());
    }

    /// Move the hotspot fragments of a page into this accumulator.
    pub fn add_hotspots_page(&mut self, mut page: PageEnvelope) {
        self.extend_hotspots(page.take_hotspots());
    }

    /// Issue fragments collected so far
    #[must_use]
    pub fn issues(&self) -> &[Box<RawValue>] {
        &self.issues
    }

    /// Hotspot fragments collected so far
    #[must_use]
    pub fn hotspots(&self) -> &[Box<RawValue>] {
        &self.hotspots
    }

    /// `(issues, hotspots)` collected so far
    #[must_use]
    pub fn counts(&self) -> (usize, usize) {
        (self.issues.len(), self.hotspots.len())
    }

    /// Build the combined document from everything collected.
    ///
    /// # Errors
    ///
    /// See [`build_document`].
    pub fn to_document(&self) -> Result<String, SonarError> {
        build_document(&self.issues, &self.hotspots)
    }
}
