//! Request state and query construction.
//!
//! [`ImageRequestState`] is the context an operation runs against: which
//! image to transform, and the base name and format of the file to write.
//! Every field is validated on assignment, and a rejected value leaves the
//! previous one in place.
//!
//! A request is the ordered mapping `s=<source>&q=<code>&<params...>`
//! appended to the service endpoint. Values are form-urlencoded so that
//! source URLs with their own query strings, and label text containing `&`
//! or `=`, survive the trip intact.

use crate::codec::Format;
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::transport::TransportError;
use reqwest::Url;

/// Ordered `(key, value)` query parameters for one request.
pub type QueryParams = Vec<(&'static str, String)>;

/// Source, destination and most recent operation for one client.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequestState {
    source: String,
    file_name: String,
    format: Format,
    last_operation: Option<Operation>,
}

/// Case-insensitive `http://` or `https://` prefix.
pub fn validate_source(source: &str) -> Result<()> {
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        source
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if has_scheme {
        Ok(())
    } else {
        Err(Error::InvalidSource(source.to_string()))
    }
}

/// Non-empty, and a bare name: output always lands directly in `output_dir`.
pub fn validate_file_name(file_name: &str) -> Result<()> {
    if file_name.is_empty() || file_name.contains(['/', '\\']) {
        return Err(Error::InvalidFileName);
    }
    Ok(())
}

impl ImageRequestState {
    pub fn new(
        source: impl Into<String>,
        file_name: impl Into<String>,
        format: &str,
    ) -> Result<Self> {
        let source = source.into();
        let file_name = file_name.into();
        validate_source(&source)?;
        validate_file_name(&file_name)?;
        let format = format.parse()?;
        Ok(Self {
            source,
            file_name,
            format,
            last_operation: None,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn last_operation(&self) -> Option<&Operation> {
        self.last_operation.as_ref()
    }

    pub fn set_source(&mut self, source: impl Into<String>) -> Result<()> {
        let source = source.into();
        validate_source(&source)?;
        self.source = source;
        Ok(())
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) -> Result<()> {
        let file_name = file_name.into();
        validate_file_name(&file_name)?;
        self.file_name = file_name;
        Ok(())
    }

    pub fn set_format(&mut self, format: &str) -> Result<()> {
        self.format = format.parse()?;
        Ok(())
    }

    pub(crate) fn record(&mut self, operation: Operation) {
        self.last_operation = Some(operation);
    }

    /// `<file name>.<format>`, e.g. `lion.png`.
    pub fn destination_file_name(&self) -> String {
        format!("{}.{}", self.file_name, self.format.extension())
    }

    /// Validate `operation` and build its full query mapping.
    pub fn query(&self, operation: &Operation) -> Result<QueryParams> {
        operation.validate()?;
        let mut params: QueryParams = vec![
            ("s", self.source.clone()),
            ("q", operation.code().to_string()),
        ];
        params.extend(operation.params());
        Ok(params)
    }
}

/// Append `params` to `endpoint` as a query string.
///
/// Any query already on the endpoint is kept and the new pairs follow it.
pub fn request_url(endpoint: &str, params: &[(&'static str, String)]) -> Result<Url> {
    let mut url = Url::parse(endpoint).map_err(|e| {
        Error::TransportFailure(TransportError::InvalidUrl {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })
    })?;
    url.query_pairs_mut()
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    Ok(url)
}
