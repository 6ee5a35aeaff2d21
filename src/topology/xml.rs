//! Hand-rolled XML export of a line's branch topology (spec.md §6.4). No
//! XML crate: this format is small enough (five element types) that a
//! free-function serializer is the better fit than adding a dependency for
//! one bespoke schema.

use crate::model::{BranchTopologyResult, Line, StationId};

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn station_children(ids: &[StationId]) -> String {
    let mut s = String::new();
    for id in ids {
        s.push_str("<Station id=\"");
        s.push_str(&escape_xml(id));
        s.push_str("\"/>");
    }
    s
}

fn render_component(result: &BranchTopologyResult) -> String {
    if !result.valid {
        return format!(
            "<InvalidComponent reason=\"{}\"/>",
            escape_xml(result.reason.as_deref().unwrap_or("unknown"))
        );
    }
    if result.is_loop == Some(true) {
        return format!("<Loop>{}</Loop>", station_children(&result.trunk_station_ids));
    }

    let mut body = String::new();
    if let Some(iv) = result.intervals.iter().find(|iv| iv.is_left_open()) {
        body.push_str(&format!(
            "<RightBranch attachTo=\"{}\">{}</RightBranch>",
            escape_xml(iv.to_station_id.as_deref().unwrap_or("")),
            station_children(&iv.station_ids)
        ));
    }
    body.push_str(&format!(
        "<Trunk>{}</Trunk>",
        station_children(&result.trunk_station_ids)
    ));
    for iv in result
        .intervals
        .iter()
        .filter(|iv| !iv.is_left_open() && !iv.is_right_open())
    {
        body.push_str(&format!(
            "<BranchInterval fromStation=\"{}\" toStation=\"{}\">{}</BranchInterval>",
            escape_xml(iv.from_station_id.as_deref().unwrap_or("")),
            escape_xml(iv.to_station_id.as_deref().unwrap_or("")),
            station_children(&iv.station_ids)
        ));
    }
    if let Some(iv) = result.intervals.iter().find(|iv| iv.is_right_open()) {
        body.push_str(&format!(
            "<LeftBranch attachTo=\"{}\">{}</LeftBranch>",
            escape_xml(iv.from_station_id.as_deref().unwrap_or("")),
            station_children(&iv.station_ids)
        ));
    }
    for mb in &result.mid_branches {
        body.push_str(&format!(
            "<MidBranch attachTo=\"{}\">{}</MidBranch>",
            escape_xml(&mb.attach_to_station_id),
            station_children(&mb.station_ids)
        ));
    }
    body
}

/// Render one line's full set of per-component results as an XML document
/// (spec.md §6.4).
pub fn render_line(line: &Line, results: &[BranchTopologyResult]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    let attrs = format!(
        "id=\"{}\" nameZh=\"{}\" nameEn=\"{}\" color=\"{}\"",
        escape_xml(&line.id),
        escape_xml(&line.name.primary),
        escape_xml(&line.name.secondary),
        escape_xml(&line.color)
    );

    if results.len() == 1 {
        out.push_str(&format!("<MetroLine {attrs}>"));
        out.push_str(&render_component(&results[0]));
        out.push_str("</MetroLine>");
    } else {
        out.push_str(&format!("<MetroLineComponents {attrs}>"));
        for r in results {
            out.push_str("<MetroLine>");
            out.push_str(&render_component(r));
            out.push_str("</MetroLine>");
        }
        out.push_str("</MetroLineComponents>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(escape_xml("A & B <C> \"D\" 'E'"), "A &amp; B &lt;C&gt; &quot;D&quot; &apos;E&apos;");
    }

    #[test]
    fn invalid_component_round_trips_reason() {
        let line = Line {
            id: "l1".into(),
            name: crate::model::LocalizedName::default(),
            color: "#fff".into(),
            status: crate::model::LineStatus::Open,
            style: crate::model::LineStyle::Solid,
            is_loop: false,
            edge_ids: vec![],
        };
        let result = BranchTopologyResult::invalid("node X has degree >= 4");
        let xml = render_line(&line, &[result]);
        assert!(xml.contains("InvalidComponent"));
        assert!(xml.contains("degree &gt;= 4"));
    }
}
