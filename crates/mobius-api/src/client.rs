// Mobius REST client
//
// Wraps `reqwest::Client` with base-URL joining and the session
// middleware. Endpoint groups (devices, policies, ...) are inherent
// methods implemented in their own modules; this file only carries the
// transport mechanics every one of them goes through.

use reqwest::RequestBuilder;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::middleware;
use crate::session::Session;
use crate::transport::{TransportConfig, normalize_base_url};

/// Async client for the Mobius MDM API.
///
/// Holds exactly one [`Session`]. Every request reads the session token
/// before dispatch; a 401 clears it.
pub struct MobiusClient {
    http: reqwest::Client,
    base_url: Url,
    session: Session,
}

impl MobiusClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a transport config and a session.
    pub fn new(transport: &TransportConfig, session: Session) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = transport.parsed_base_url()?;
        debug!(base_url = %base_url, "building Mobius client");
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// The caller is responsible for timeouts and default headers.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        session: Session,
    ) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url)?,
            session,
        })
    }

    /// The API base URL, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The session this client authenticates with.
    pub fn session(&self) -> &Session {
        &self.session
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append `segments` to the base URL, percent-encoding each one.
    ///
    /// Returns the URL together with the unencoded `a/b/c` label used in
    /// logs and [`SessionEvent::Unauthorized`](crate::SessionEvent).
    fn endpoint(&self, segments: &[&str]) -> Result<(Url, String), Error> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(Error::InvalidPathSegment((*bad).to_owned()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);

        Ok((url, segments.join("/")))
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Run both middleware steps around a single send.
    async fn send(&self, builder: RequestBuilder, path: &str) -> Result<reqwest::Response, Error> {
        let builder = middleware::apply_bearer(builder, &self.session)?;
        let resp = builder.send().await?;
        middleware::intercept_response(resp, &self.session, path).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, Error> {
        let (url, path) = self.endpoint(segments)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url), &path).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn get_with_query<T, Q>(
        &self,
        segments: &[&str],
        query: &Q,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let (url, path) = self.endpoint(segments)?;
        debug!("GET {url} (with query)");

        let resp = self.send(self.http.get(url).query(query), &path).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn post<T, B>(&self, segments: &[&str], body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let (url, path) = self.endpoint(segments)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body), &path).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn post_no_response<B>(&self, segments: &[&str], body: &B) -> Result<(), Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let (url, path) = self.endpoint(segments)?;
        debug!("POST {url}");

        self.send(self.http.post(url).json(body), &path).await?;
        Ok(())
    }

    /// POST with no request body and no meaningful response body.
    pub(crate) async fn post_empty(&self, segments: &[&str]) -> Result<(), Error> {
        let (url, path) = self.endpoint(segments)?;
        debug!("POST {url}");

        self.send(self.http.post(url), &path).await?;
        Ok(())
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        let (url, path) = self.endpoint(segments)?;
        debug!("POST {url} (multipart)");

        let resp = self.send(self.http.post(url).multipart(form), &path).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn put<T, B>(&self, segments: &[&str], body: &B) -> Result<T, Error>
    where
        T: DeserializeOwned,
        B: Serialize + Sync + ?Sized,
    {
        let (url, path) = self.endpoint(segments)?;
        debug!("PUT {url}");

        let resp = self.send(self.http.put(url).json(body), &path).await?;
        Self::decode(resp).await
    }

    pub(crate) async fn put_no_response<B>(&self, segments: &[&str], body: &B) -> Result<(), Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let (url, path) = self.endpoint(segments)?;
        debug!("PUT {url}");

        self.send(self.http.put(url).json(body), &path).await?;
        Ok(())
    }

    pub(crate) async fn delete(&self, segments: &[&str]) -> Result<(), Error> {
        let (url, path) = self.endpoint(segments)?;
        debug!("DELETE {url}");

        self.send(self.http.delete(url), &path).await?;
        Ok(())
    }
}

impl std::fmt::Debug for MobiusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MobiusClient")
            .field("base_url", &self.base_url.as_str())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
