// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::io;
use std::sync::Arc;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::mesh::Mesh;
use crate::route::{Solution, Waypoint};

const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

#[derive(Debug, Clone, thiserror::Error)]
pub enum GpxError {
    #[error("xml: {0}")]
    Xml(Arc<quick_xml::Error>),

    #[error("io: {0}")]
    Io(Arc<io::Error>),
}

impl From<quick_xml::Error> for GpxError {
    fn from(e: quick_xml::Error) -> Self {
        GpxError::Xml(Arc::new(e))
    }
}

impl From<io::Error> for GpxError {
    fn from(e: io::Error) -> Self {
        GpxError::Io(Arc::new(e))
    }
}

/// Writes a GPX 1.1 document with a `<wpt>` for every waypoint
/// and a `<trk>` for every solution.
pub fn write_gpx<W: io::Write>(
    writer: W,
    mesh: &Mesh,
    waypoints: &[Waypoint],
    solutions: &[Solution],
) -> Result<(), GpxError> {
    let mut w = Writer::new_with_indent(writer, b' ', 2);

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", "routemesh"),
        ("xmlns", GPX_NAMESPACE),
    ])))?;

    for (i, waypoint) in waypoints.iter().enumerate() {
        let lat = waypoint.lat.to_string();
        let lon = waypoint.lon.to_string();
        w.write_event(Event::Start(
            BytesStart::new("wpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
        ))?;
        text_element(&mut w, "name", &format!("Waypoint {}", i + 1))?;
        w.write_event(Event::End(BytesEnd::new("wpt")))?;
    }

    for s in solutions {
        w.write_event(Event::Start(BytesStart::new("trk")))?;
        text_element(&mut w, "name", &format!("Route {} to {}", s.from + 1, s.to + 1))?;
        text_element(
            &mut w,
            "desc",
            &format!(
                "distance: {:.0} m, duration: {:.0} s, cost: {:.3}",
                s.distance_m, s.duration_s, s.cost,
            ),
        )?;

        w.write_event(Event::Start(BytesStart::new("trkseg")))?;
        for (lat, lon) in s.coordinates(mesh) {
            let lat = lat.to_string();
            let lon = lon.to_string();
            w.write_event(Event::Empty(
                BytesStart::new("trkpt")
                    .with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
            ))?;
        }
        w.write_event(Event::End(BytesEnd::new("trkseg")))?;
        w.write_event(Event::End(BytesEnd::new("trk")))?;
    }

    w.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(())
}

fn text_element<W: io::Write>(w: &mut Writer<W>, name: &str, text: &str) -> Result<(), GpxError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
