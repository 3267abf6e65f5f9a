use super::{Auth, Client, Result};

// -------------------------------------------------------------------------------------------------
// ClientBuilder
// -------------------------------------------------------------------------------------------------
pub struct ClientBuilder {
    auth: Auth,
    ignore_certs: bool,
    accept: &'static str,
}

impl ClientBuilder {
    /// The user agent string sent when accessing source-code host APIs
    const USER_AGENT: &'static str = concat!("committime-exporter/", env!("CARGO_PKG_VERSION"));

    /// Create a new `ClientBuilder` that uses unauthenticated access.
    pub fn new() -> Self {
        ClientBuilder {
            auth: Auth::Unauthenticated,
            ignore_certs: false,
            accept: "application/json",
        }
    }

    /// Use the given authentication mechanism.
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Ignore validation of TLS certs.
    pub fn ignore_certs(mut self, ignore_certs: bool) -> Self {
        self.ignore_certs = ignore_certs;
        self
    }

    /// Send the given media type in the `Accept` header.
    pub fn accept(mut self, accept: &'static str) -> Self {
        self.accept = accept;
        self
    }

    /// Build a `Client` from this `ClientBuilder`.
    pub fn build(self) -> Result<Client> {
        let inner = reqwest::ClientBuilder::new()
            .user_agent(Self::USER_AGENT)
            .danger_accept_invalid_certs(self.ignore_certs)
            .build()?;
        Ok(Client {
            inner,
            auth: self.auth,
            accept: self.accept,
        })
    }
}

impl Default for ClientBuilder {
    /// Equivalent to `ClientBuilder::new()`.
    fn default() -> Self {
        Self::new()
    }
}
