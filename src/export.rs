//! Document export: the HTML fragment of a voucher and the renderer that turns it into a file.
use chrono::Utc;

use crate::approval::{Signable, SlotId};
use crate::grant::Grant;
use crate::payment::Payment;
use crate::prefinancing::Prefinancing;
use crate::types::TimeStamp;

/// A rendered, downloadable document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// sha256 of `bytes`, hex encoded.
    pub digest: String,
}

impl RenderedDocument {
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        let digest = sha256::digest(bytes.as_slice());
        Self {
            file_name: file_name.to_string(),
            bytes,
            digest,
        }
    }
}

pub trait DocumentRenderer {
    fn render_to_file(&self, name: &str, html_fragment: &str) -> anyhow::Result<RenderedDocument>;
}

/// Wraps the fragment in a standalone HTML page.
#[derive(Debug, Clone, Default)]
pub struct HtmlRenderer;

impl DocumentRenderer for HtmlRenderer {
    fn render_to_file(&self, name: &str, html_fragment: &str) -> anyhow::Result<RenderedDocument> {
        if html_fragment.trim().is_empty() {
            anyhow::bail!("nothing to render for {name}");
        }
        let page = format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title></head><body>{}</body></html>",
            escape(name),
            html_fragment
        );
        Ok(RenderedDocument::new(&format!("{name}.html"), page.into_bytes()))
    }
}

/// The printable side of a signable record.
pub trait Voucher: Signable {
    fn title(&self) -> &'static str;
    fn number(&self) -> &str;
    fn beneficiary(&self) -> &str;
    fn label(&self) -> &str;
    fn issued_on(&self) -> &TimeStamp<Utc>;
}

impl Voucher for Payment {
    fn title(&self) -> &'static str {
        "Payment voucher"
    }
    fn number(&self) -> &str {
        &self.number
    }
    fn beneficiary(&self) -> &str {
        &self.beneficiary
    }
    fn label(&self) -> &str {
        &self.description
    }
    fn issued_on(&self) -> &TimeStamp<Utc> {
        &self.payment_date
    }
}

impl Voucher for Prefinancing {
    fn title(&self) -> &'static str {
        "Prefinancing voucher"
    }
    fn number(&self) -> &str {
        &self.number
    }
    fn beneficiary(&self) -> &str {
        &self.beneficiary
    }
    fn label(&self) -> &str {
        &self.purpose
    }
    fn issued_on(&self) -> &TimeStamp<Utc> {
        &self.issue_date
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn slot_title(slot: SlotId) -> &'static str {
    match slot {
        SlotId::Supervisor1 => "Grant coordinator",
        SlotId::Supervisor2 => "Accountant",
        SlotId::FinalApproval => "National coordinator",
    }
}

pub fn voucher_html<T: Voucher>(record: &T, grant: &Grant) -> String {
    let mut html = format!(
        "<h1>{}</h1><p>No. {}</p><p>Grant: {} ({})</p><p>Beneficiary: {}</p><p>Amount: {}</p><p>Date: {}</p><p>{}</p><p>Status: {}</p>",
        record.title(),
        escape(record.number()),
        escape(&grant.name),
        escape(&grant.code),
        escape(record.beneficiary()),
        grant.format(record.amount()),
        record.issued_on(),
        escape(record.label()),
        record.status(),
    );

    html.push_str("<table><tr><th>Signatory</th><th>Name</th><th>Date</th><th>Observation</th></tr>");
    for slot in SlotId::ALL {
        let signed = record.approvals().get(slot).filter(|s| s.signature);
        let (name, date, observation) = match signed {
            Some(s) => (
                escape(&s.name),
                s.date.as_ref().map(ToString::to_string).unwrap_or_default(),
                escape(s.observation.as_deref().unwrap_or_default()),
            ),
            None => (String::new(), String::new(), String::new()),
        };
        html.push_str(&format!(
            "<tr><td>{}</td><td>{name}</td><td>{date}</td><td>{observation}</td></tr>",
            slot_title(slot)
        ));
    }
    html.push_str("</table>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::Currency;
    use crate::prefinancing::PrefinancingDraft;

    fn grant() -> Grant {
        Grant {
            id: "grant_1".into(),
            code: "GF-2025".into(),
            name: "Fonds <Mondial>".into(),
            currency: Currency::XOF,
            amount: 50_000_000,
            start_date: TimeStamp::on_day(2025, 1, 1),
            end_date: TimeStamp::on_day(2027, 12, 31),
        }
    }

    #[test]
    fn voucher_is_escaped_and_formatted() {
        let advance = PrefinancingDraft::new()
            .set_number("PF/01")
            .set_grant("grant_1")
            .set_beneficiary("O'Brien & Sons")
            .set_amount(1_500_000)
            .set_issue_date(TimeStamp::on_day(2025, 4, 2))
            .validate_and_finalise()
            .unwrap();

        let html = voucher_html(&advance, &grant());

        assert!(html.contains("O&#39;Brien &amp; Sons"));
        assert!(html.contains("Fonds &lt;Mondial&gt;"));
        assert!(html.contains("1 500 000 XOF"));
        assert!(html.contains("2025-04-02"));
        assert!(!html.contains("<Mondial>"));
    }

    #[test]
    fn rendered_document_carries_digest() {
        let doc = HtmlRenderer.render_to_file("PF-01", "<p>x</p>").unwrap();

        assert_eq!(doc.file_name, "PF-01.html");
        assert_eq!(doc.digest, sha256::digest(doc.bytes.as_slice()));
        assert!(HtmlRenderer.render_to_file("empty", "  ").is_err());
    }
}
