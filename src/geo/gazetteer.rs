//! GeoNames gazetteer client.
//!
//! One blocking GET per lookup:
//! `endpoint?name_equals=..&continentCode=..&maxRows=..&username=..`.
//! The response is XML; only the first `<geoname>` is read.
//!
//! "No such place" is `Ok(None)`. Transport failures and error statuses are
//! `Error::GazetteerUnavailable` so a session never mistakes an outage for
//! an empty result.

use std::borrow::Cow;
use std::time::Duration;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;

use crate::config::GazetteerConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Place-name to coordinate lookup.
pub trait Gazetteer {
    fn lookup(&self, place_name: &str) -> Result<Option<Coordinates>>;
}

/// Fetches the raw XML answer for a set of query parameters.
pub trait GazetteerTransport {
    fn fetch(&self, params: &[(&'static str, String)]) -> Result<String>;
}

impl<F> GazetteerTransport for F
where
    F: Fn(&[(&'static str, String)]) -> Result<String>,
{
    fn fetch(&self, params: &[(&'static str, String)]) -> Result<String> {
        self(params)
    }
}

/// Blocking HTTP transport for one gazetteer endpoint.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    /// No timeout unless one is given.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::GazetteerUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl GazetteerTransport for HttpTransport {
    fn fetch(&self, params: &[(&'static str, String)]) -> Result<String> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(params)
            .send()
            .map_err(|e| Error::GazetteerUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::GazetteerUnavailable(format!(
                "{} returned HTTP {}",
                self.endpoint, status
            )));
        }

        response
            .text()
            .map_err(|e| Error::GazetteerUnavailable(e.to_string()))
    }
}

/// GeoNames search API client.
pub struct GeoNames<T = HttpTransport> {
    transport: T,
    username: String,
    continent_code: String,
    max_rows: usize,
}

impl GeoNames<HttpTransport> {
    /// Client over HTTP, configured from the `[gazetteer]` section.
    pub fn from_config(config: &GazetteerConfig) -> Result<Self> {
        let transport = HttpTransport::new(
            &config.endpoint,
            config.timeout_secs.map(Duration::from_secs),
        )?;
        Ok(Self::with_transport(transport, config))
    }
}

impl<T: GazetteerTransport> GeoNames<T> {
    /// Client over any transport, e.g. a canned response in tests.
    pub fn with_transport(transport: T, config: &GazetteerConfig) -> Self {
        Self {
            transport,
            username: config.username.clone(),
            continent_code: config.continent_code.clone(),
            max_rows: config.max_rows,
        }
    }

    fn query_params(&self, place_name: &str) -> Vec<(&'static str, String)> {
        vec![
            ("name_equals", place_name.to_string()),
            ("continentCode", self.continent_code.clone()),
            ("maxRows", self.max_rows.to_string()),
            ("username", self.username.clone()),
        ]
    }
}

impl<T: GazetteerTransport> Gazetteer for GeoNames<T> {
    fn lookup(&self, place_name: &str) -> Result<Option<Coordinates>> {
        tracing::debug!(place = place_name, "gazetteer lookup");
        let xml = self.transport.fetch(&self.query_params(place_name))?;
        parse_first_geoname(&xml)
    }
}

#[derive(Clone, Copy)]
enum Field {
    Lat,
    Lng,
}

/// Coordinates of the first `<geoname>` element, if any.
pub fn parse_first_geoname(xml: &str) -> Result<Option<Coordinates>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_geoname = false;
    let mut field: Option<Field> = None;
    let mut lat: Option<String> = None;
    let mut lng: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"geoname" => in_geoname = true,
                b"lat" if in_geoname => field = Some(Field::Lat),
                b"lng" if in_geoname => field = Some(Field::Lng),
                b"status" if !in_geoname => return Err(status_error(&e)),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"geoname" => {
                    in_geoname = true;
                    break;
                }
                b"status" if !in_geoname => return Err(status_error(&e)),
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(f) = field {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::GazetteerResponse(e.to_string()))?
                        .into_owned();
                    match f {
                        Field::Lat => lat = Some(text),
                        Field::Lng => lng = Some(text),
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"geoname" if in_geoname => break,
                b"lat" | b"lng" => field = None,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::GazetteerResponse(format!(
                    "XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if !in_geoname {
        return Ok(None);
    }

    Ok(Some(Coordinates {
        latitude: parse_coordinate("lat", lat)?,
        longitude: parse_coordinate("lng", lng)?,
    }))
}

fn parse_coordinate(name: &str, value: Option<String>) -> Result<f64> {
    let value = value
        .ok_or_else(|| Error::GazetteerResponse(format!("<geoname> without <{}>", name)))?;
    value
        .trim()
        .parse()
        .map_err(|_| Error::GazetteerResponse(format!("<{}> is not a number: {:?}", name, value)))
}

/// GeoNames reports quota and credential problems as
/// `<status message=".." value=".."/>`.
fn status_error(element: &BytesStart<'_>) -> Error {
    let message = element
        .try_get_attribute("message")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(Cow::into_owned))
        .unwrap_or_else(|| "gazetteer returned an error status".to_string());
    Error::GazetteerUnavailable(message)
}
