//! Request builder.
//!
//! # Responsibilities
//! - Hold method, target URL, headers, query parameters and body
//! - Chainable setters returning `&mut Self`
//! - Turn the builder into a wire request at fetch time
//!
//! # Design Decisions
//! - Only URL parsing validates at construction
//! - Bad header names/values are remembered and reported by `fetch`
//! - Query parameters are encoded with sorted keys, so insertion order never
//!   changes the wire form
//! - Fixed bodies can be sent any number of times; streamed bodies once

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use serde::Serialize;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;
use url::Url;

use crate::error::{BoxError, Error, Result};
use crate::transport::{empty_body, full_body, RequestBody};

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
}

impl Method {
    pub const ALL: [Method; 9] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
        Method::Head,
        Method::Options,
        Method::Connect,
        Method::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Connect => "CONNECT",
            Method::Trace => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidRequest(format!("unknown method: {}", s)))
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
            Method::Patch => http::Method::PATCH,
            Method::Head => http::Method::HEAD,
            Method::Options => http::Method::OPTIONS,
            Method::Connect => http::Method::CONNECT,
            Method::Trace => http::Method::TRACE,
        }
    }
}

/// A one-shot stream of body chunks.
pub struct ByteStream {
    inner: Option<BoxStream<'static, std::result::Result<Bytes, BoxError>>>,
}

impl ByteStream {
    /// True once the stream has been handed to a transport.
    pub fn is_consumed(&self) -> bool {
        self.inner.is_none()
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Request payload.
#[derive(Debug, Default)]
pub enum Body {
    #[default]
    Empty,
    Fixed(Bytes),
    Stream(ByteStream),
}

/// A mutable HTTP request builder.
#[derive(Debug)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    query: BTreeMap<String, Vec<String>>,
    body: Body,
    invalid: Option<String>,
}

impl Request {
    /// Create a request for an absolute URL.
    ///
    /// Query pairs already present in `url` seed the query parameters.
    pub fn new(method: Method, url: &str) -> Result<Self> {
        let mut url = Url::parse(url)?;
        if !url.has_host() {
            return Err(Error::InvalidUrl(format!("{} has no host", url)));
        }

        let mut query: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            query.entry(key.into_owned()).or_default().push(value.into_owned());
        }
        url.set_query(None);

        Ok(Self {
            method,
            url,
            headers: HeaderMap::new(),
            query,
            body: Body::Empty,
            invalid: None,
        })
    }

    pub fn get(url: &str) -> Result<Self> {
        Self::new(Method::Get, url)
    }

    pub fn post(url: &str) -> Result<Self> {
        Self::new(Method::Post, url)
    }

    pub fn put(url: &str) -> Result<Self> {
        Self::new(Method::Put, url)
    }

    pub fn delete(url: &str) -> Result<Self> {
        Self::new(Method::Delete, url)
    }

    pub fn patch(url: &str) -> Result<Self> {
        Self::new(Method::Patch, url)
    }

    pub fn head(url: &str) -> Result<Self> {
        Self::new(Method::Head, url)
    }

    pub fn options(url: &str) -> Result<Self> {
        Self::new(Method::Options, url)
    }

    pub fn connect(url: &str) -> Result<Self> {
        Self::new(Method::Connect, url)
    }

    pub fn trace(url: &str) -> Result<Self> {
        Self::new(Method::Trace, url)
    }

    /// Append a header value, keeping existing ones.
    pub fn add_header(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some((name, value)) = self.header_pair(key, value) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replace all values of a header.
    pub fn set_header(&mut self, key: &str, value: &str) -> &mut Self {
        if let Some((name, value)) = self.header_pair(key, value) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn del_header(&mut self, key: &str) -> &mut Self {
        self.headers.remove(key);
        self
    }

    pub fn add_query(&mut self, key: &str, value: &str) -> &mut Self {
        self.query.entry(key.to_string()).or_default().push(value.to_string());
        self
    }

    pub fn set_query(&mut self, key: &str, value: &str) -> &mut Self {
        self.query.insert(key.to_string(), vec![value.to_string()]);
        self
    }

    pub fn del_query(&mut self, key: &str) -> &mut Self {
        self.query.remove(key);
        self
    }

    /// Replace the URL path; reserved characters are percent-encoded.
    pub fn set_path(&mut self, path: &str) -> &mut Self {
        self.url.set_path(path);
        self
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) -> &mut Self {
        self.body = Body::Fixed(body.into());
        self
    }

    /// Stream the body from a reader without buffering it.
    pub fn set_body_reader<R>(&mut self, reader: R) -> &mut Self
    where
        R: AsyncRead + Send + 'static,
    {
        self.set_body_stream(ReaderStream::new(reader))
    }

    /// Stream the body from chunks.
    pub fn set_body_stream<S, E>(&mut self, stream: S) -> &mut Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.body = Body::Stream(ByteStream {
            inner: Some(stream.map_err(|e| -> BoxError { e.into() }).boxed()),
        });
        self
    }

    /// Encode `value` as JSON and use it as the body.
    pub fn set_json<T>(&mut self, value: &T) -> Result<&mut Self>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(value).map_err(Error::Encode)?;
        self.body = Body::Fixed(data.into());
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(self)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The target URL, without the query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `scheme://host[:port]`
    pub fn base_url(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// The percent-encoded path.
    pub fn path(&self) -> &str {
        self.url.path()
    }

    pub fn raw_query(&self) -> &BTreeMap<String, Vec<String>> {
        &self.query
    }

    /// The encoded query string, keys sorted.
    pub fn query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.query {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    /// The full URL that will be sent, query included.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        let query = self.query();
        url.set_query((!query.is_empty()).then_some(query.as_str()));
        url.set_fragment(None);
        url
    }

    /// Build the wire request. Streamed bodies are taken.
    pub(crate) fn to_http(&mut self) -> Result<http::Request<RequestBody>> {
        if let Some(reason) = &self.invalid {
            return Err(Error::InvalidRequest(reason.clone()));
        }

        let uri: http::Uri = self
            .full_url()
            .as_str()
            .parse()
            .map_err(|e: http::uri::InvalidUri| Error::InvalidUrl(e.to_string()))?;

        let body = match &mut self.body {
            Body::Empty => empty_body(),
            Body::Fixed(bytes) => full_body(bytes.clone()),
            Body::Stream(stream) => match stream.inner.take() {
                Some(chunks) => StreamBody::new(chunks.map_ok(Frame::data)).boxed_unsync(),
                None => {
                    return Err(Error::InvalidRequest(
                        "streamed body was already sent".to_string(),
                    ))
                }
            },
        };

        let mut request = http::Request::builder()
            .method(http::Method::from(self.method))
            .uri(uri)
            .body(body)
            .map_err(|e| Error::InvalidRequest(e.to_string()))?;
        *request.headers_mut() = self.headers.clone();

        Ok(request)
    }

    fn header_pair(&mut self, key: &str, value: &str) -> Option<(HeaderName, HeaderValue)> {
        let name = match HeaderName::from_bytes(key.as_bytes()) {
            Ok(name) => name,
            Err(_) => {
                self.invalid = Some(format!("invalid header name: {:?}", key));
                return None;
            }
        };
        match HeaderValue::from_str(value) {
            Ok(value) => Some((name, value)),
            Err(_) => {
                self.invalid = Some(format!("invalid value for header {}", name));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn rejects_relative_and_hostless_urls() {
        assert!(matches!(Request::get("/just/a/path"), Err(Error::InvalidUrl(_))));
        assert!(matches!(Request::get("not a url"), Err(Error::InvalidUrl(_))));
        assert!(matches!(Request::get("mailto:someone@example.com"), Err(Error::InvalidUrl(_))));
        assert!(Request::get("http://localhost:8080/x").is_ok());
    }

    #[test]
    fn one_constructor_per_method() {
        let ctors: [fn(&str) -> Result<Request>; 9] = [
            Request::get,
            Request::post,
            Request::put,
            Request::delete,
            Request::patch,
            Request::head,
            Request::options,
            Request::connect,
            Request::trace,
        ];
        for (ctor, method) in ctors.iter().zip(Method::ALL) {
            assert_eq!(ctor("https://example.com").unwrap().method(), method);
        }
    }

    #[test]
    fn method_round_trips_through_text() {
        for method in Method::ALL {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
            assert_eq!(http::Method::from(method).as_str(), method.as_str());
        }
        assert_eq!("patch".parse::<Method>().unwrap(), Method::Patch);
        assert!("BREW".parse::<Method>().is_err());
    }

    #[test]
    fn query_encoding_is_sorted_and_escaped() {
        let mut first = Request::get("https://example.com/search").unwrap();
        first.add_query("b", "2").add_query("a", "1");
        let mut second = Request::get("https://example.com/search").unwrap();
        second.add_query("a", "1").add_query("b", "2");

        assert_eq!(first.query(), "a=1&b=2");
        assert_eq!(first.query(), second.query());

        first.add_query("q", "x y&z").add_query("a", "0");
        assert_eq!(first.query(), "a=1&a=0&b=2&q=x+y%26z");

        first.set_query("a", "9").del_query("b");
        assert_eq!(first.query(), "a=9&q=x+y%26z");
    }

    #[test]
    fn url_query_seeds_parameters() {
        let request = Request::get("https://example.com/p?z=1&a=2#frag").unwrap();
        assert_eq!(request.query(), "a=2&z=1");
        assert_eq!(request.full_url().as_str(), "https://example.com/p?a=2&z=1");
    }

    #[test]
    fn headers_are_case_insensitive_multimaps() {
        let mut request = Request::get("https://example.com").unwrap();
        request
            .add_header("Accept", "text/plain")
            .add_header("accept", "application/json");
        assert_eq!(request.headers().get_all("ACCEPT").iter().count(), 2);

        request.set_header("ACCEPT", "*/*");
        assert_eq!(request.headers().get_all("accept").iter().count(), 1);

        request.del_header("Accept");
        assert!(request.headers().is_empty());
    }

    #[test]
    fn bad_header_is_reported_at_dispatch() {
        let mut request = Request::get("https://example.com").unwrap();
        request.set_header("bad header", "v");
        assert!(matches!(request.to_http(), Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn path_and_base_url() {
        let mut request = Request::get("https://example.com:8443/old").unwrap();
        request.set_path("/a b/c");
        assert_eq!(request.path(), "/a%20b/c");
        assert_eq!(request.base_url(), "https://example.com:8443");
    }

    #[test]
    fn set_json_sets_body_and_content_type() {
        let mut request = Request::post("https://example.com").unwrap();
        request.set_json(&serde_json::json!({"x": 1})).unwrap();
        assert_eq!(request.headers()[CONTENT_TYPE], "application/json");
        match request.body() {
            Body::Fixed(bytes) => assert_eq!(&bytes[..], br#"{"x":1}"#),
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[test]
    fn set_json_reports_encode_errors() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "tuple keys are not valid JSON object keys");
        let mut request = Request::post("https://example.com").unwrap();
        let err = request.set_json(&map).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Encoding);
    }

    #[test]
    fn wire_request_carries_everything() {
        let mut request = Request::put("https://example.com/items").unwrap();
        request
            .set_header("X-Trace", "abc")
            .add_query("v", "2")
            .set_body("payload");
        let wire = request.to_http().unwrap();
        assert_eq!(wire.method(), http::Method::PUT);
        assert_eq!(wire.uri(), "https://example.com/items?v=2");
        assert_eq!(wire.headers()["x-trace"], "abc");

        // Fixed bodies can be sent again.
        assert!(request.to_http().is_ok());
    }

    #[tokio::test]
    async fn streamed_body_is_one_shot() {
        let mut request = Request::post("https://example.com/upload").unwrap();
        let chunks = vec![Ok::<_, std::io::Error>(Bytes::from("ab")), Ok(Bytes::from("cd"))];
        request.set_body_stream(stream::iter(chunks));

        let wire = request.to_http().unwrap();
        let collected = wire.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"abcd");

        assert!(matches!(request.body(), Body::Stream(s) if s.is_consumed()));
        assert!(matches!(request.to_http(), Err(Error::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn reader_body_streams_its_contents() {
        let mut request = Request::post("https://example.com/upload").unwrap();
        request.set_body_reader(std::io::Cursor::new(b"from a reader".to_vec()));
        let wire = request.to_http().unwrap();
        let collected = wire.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&collected[..], b"from a reader");
    }
}
