//! The client: validated request state plus a transport.
//!
//! Every operation method is a thin wrapper over [`Fotocrib::apply`], which
//! in turn calls the free function [`execute`]. `execute` takes its inputs
//! explicitly (config, state, transport) so it can be driven without a
//! `Fotocrib` at all.
//!
//! One call is one round trip and one output file. Operations do not chain:
//! each request starts again from the configured source image.
//!
//! ```no_run
//! use fotocrib::Fotocrib;
//!
//! let mut client = Fotocrib::new("http://fotocrib.com/images/lion.jpg", "lion", "png")?;
//! client.repaint(5, 44, 10)?; // writes ./lion.png
//!
//! client.set_source("http://fotocrib.com/images/jubei.jpg")?;
//! client.set_file_name("jubei")?;
//! client.set_format("gif")?;
//! client.cube(255, 255, 255)?; // writes ./jubei.gif
//! # Ok::<(), fotocrib::Error>(())
//! ```

use crate::codec::{self, Format, SaveOutcome};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::operation::{Numeric, Operation};
use crate::request::{ImageRequestState, request_url};
use crate::transport::{HttpTransport, Transport};
use reqwest::Url;
use std::path::PathBuf;

/// Build the request URL for `operation` without sending it.
pub fn plan_request(
    config: &ClientConfig,
    state: &ImageRequestState,
    operation: &Operation,
) -> Result<Url> {
    let params = state.query(operation)?;
    request_url(&config.endpoint, &params)
}

/// Validate, fetch, and write one operation's result.
pub fn execute(
    transport: &impl Transport,
    config: &ClientConfig,
    state: &ImageRequestState,
    operation: &Operation,
) -> Result<SaveOutcome> {
    let url = plan_request(config, state, operation)?;
    log::debug!("{} → {url}", operation.name());

    let fetched = transport.fetch(&url)?;
    let destination = config.output_dir.join(state.destination_file_name());
    let outcome = codec::save(
        &fetched.bytes,
        fetched.content_type.as_deref(),
        state.source(),
        config.decode,
        &destination,
    )?;

    log::info!(
        "{} saved {} ({} bytes)",
        operation.name(),
        outcome.path.display(),
        outcome.bytes_written
    );
    Ok(outcome)
}

/// Client for the remote image-processing service.
pub struct Fotocrib<T: Transport = HttpTransport> {
    state: ImageRequestState,
    config: ClientConfig,
    transport: T,
}

impl Fotocrib<HttpTransport> {
    /// Client with the stock configuration.
    pub fn new(
        source: impl Into<String>,
        file_name: impl Into<String>,
        format: &str,
    ) -> Result<Self> {
        Self::with_config(source, file_name, format, ClientConfig::default())
    }

    pub fn with_config(
        source: impl Into<String>,
        file_name: impl Into<String>,
        format: &str,
        config: ClientConfig,
    ) -> Result<Self> {
        config.validate()?;
        let state = ImageRequestState::new(source, file_name, format)?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(state, config, transport)
    }
}

impl<T: Transport> Fotocrib<T> {
    /// Fails with [`Error::InvalidConfig`](crate::Error::InvalidConfig) if
    /// `config` does not pass [`ClientConfig::validate`].
    pub fn with_transport(
        state: ImageRequestState,
        config: ClientConfig,
        transport: T,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state,
            config,
            transport,
        })
    }

    pub fn state(&self) -> &ImageRequestState {
        &self.state
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn source(&self) -> &str {
        self.state.source()
    }

    pub fn file_name(&self) -> &str {
        self.state.file_name()
    }

    pub fn format(&self) -> Format {
        self.state.format()
    }

    pub fn last_operation(&self) -> Option<&Operation> {
        self.state.last_operation()
    }

    pub fn set_source(&mut self, source: impl Into<String>) -> Result<()> {
        self.state.set_source(source)
    }

    pub fn set_file_name(&mut self, file_name: impl Into<String>) -> Result<()> {
        self.state.set_file_name(file_name)
    }

    pub fn set_format(&mut self, format: &str) -> Result<()> {
        self.state.set_format(format)
    }

    /// Where the next successful operation will write.
    pub fn destination(&self) -> PathBuf {
        self.config.output_dir.join(self.state.destination_file_name())
    }

    /// Dry run: the URL `apply` would fetch.
    pub fn plan(&self, operation: &Operation) -> Result<Url> {
        plan_request(&self.config, &self.state, operation)
    }

    /// Run one operation against the current source and write the result.
    ///
    /// Arguments are validated before anything is sent; a rejected operation
    /// makes no request and is not recorded as the last operation.
    pub fn apply(&mut self, operation: Operation) -> Result<SaveOutcome> {
        operation.validate()?;
        self.state.record(operation.clone());
        execute(&self.transport, &self.config, &self.state, &operation)
    }

    pub fn thumbnail(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Thumbnail)
    }

    /// Overlay `text` at one of the nine [`Location`](crate::Location) names.
    pub fn label(
        &mut self,
        text: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<SaveOutcome> {
        self.apply(Operation::label(text, location))
    }

    pub fn round_corners(&mut self, radius: impl Into<Numeric>) -> Result<SaveOutcome> {
        self.apply(Operation::round_corners(radius))
    }

    /// Turn the image into a cube on a background of the given color.
    pub fn cube(
        &mut self,
        r: impl Into<Numeric>,
        g: impl Into<Numeric>,
        b: impl Into<Numeric>,
    ) -> Result<SaveOutcome> {
        self.apply(Operation::cube(r, g, b))
    }

    pub fn raise(&mut self, height: impl Into<Numeric>) -> Result<SaveOutcome> {
        self.apply(Operation::raise(height))
    }

    /// Scale to `pct` percent of the original size.
    pub fn scale(&mut self, pct: impl Into<Numeric>) -> Result<SaveOutcome> {
        self.apply(Operation::scale(pct))
    }

    pub fn resize(
        &mut self,
        width: impl Into<Numeric>,
        height: impl Into<Numeric>,
    ) -> Result<SaveOutcome> {
        self.apply(Operation::resize(width, height))
    }

    pub fn focus(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Focus)
    }

    pub fn emboss(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Emboss)
    }

    /// Oil-painting effect.
    pub fn paint(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Paint)
    }

    pub fn repaint(
        &mut self,
        r: impl Into<Numeric>,
        g: impl Into<Numeric>,
        b: impl Into<Numeric>,
    ) -> Result<SaveOutcome> {
        self.apply(Operation::repaint(r, g, b))
    }

    /// Frame `thickness` pixels wide in the given color.
    pub fn frame(
        &mut self,
        thickness: impl Into<Numeric>,
        r: impl Into<Numeric>,
        g: impl Into<Numeric>,
        b: impl Into<Numeric>,
    ) -> Result<SaveOutcome> {
        self.apply(Operation::frame(thickness, r, g, b))
    }

    pub fn round_frame(
        &mut self,
        thickness: impl Into<Numeric>,
        radius: impl Into<Numeric>,
        r: impl Into<Numeric>,
        g: impl Into<Numeric>,
        b: impl Into<Numeric>,
    ) -> Result<SaveOutcome> {
        self.apply(Operation::round_frame(thickness, radius, r, g, b))
    }

    pub fn mirror(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Mirror)
    }

    pub fn grayscale(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Grayscale)
    }

    pub fn blur(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Blur)
    }

    pub fn brighten(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Brighten)
    }

    pub fn sobel(&mut self) -> Result<SaveOutcome> {
        self.apply(Operation::Sobel)
    }
}
