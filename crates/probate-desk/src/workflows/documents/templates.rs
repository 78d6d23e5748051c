use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::catalog::CoverLetterKind;
use super::layout::{applicant_names, deceased_name};
use crate::workflows::estate::NormalizedEstateData;

const WILL_SEARCH: &str = r#"<p>{{letter_date}}</p>
<p>Vital Statistics Agency, Wills Registry</p>
<p>PO Box 9657 Stn Prov Govt, Victoria, BC V8W 9P3</p>
<p class="heading">Re: Wills notice search for {{deceased_name}} (date of death {{date_of_death}})</p>
<p>Please find enclosed a completed Application for Search of Wills Notice together with a copy of the death certificate for the above-named deceased.</p>
<p>Kindly send the search certificate to the applicant at {{applicant_address}}.</p>
<p>Our file reference is {{case_code}}.</p>
<p>Yours truly,</p>
<p>{{applicant_name}}</p>"#;

const NOTICE: &str = r#"<p>{{letter_date}}</p>
<p class="heading">Re: Estate of {{deceased_name}}, deceased</p>
<p>Enclosed is a Notice of Proposed Application in Form P1. {{applicant_names}} intend(s) to apply to the {{registry}} registry for a {{grant_type}}.</p>
<p>You are receiving this package because you are a beneficiary or may otherwise be entitled to a share of the estate. No action is required unless you wish to dispute the application.</p>
<p>The application will not be filed until at least 21 days after this notice is delivered to you.</p>
<p>Questions may be directed to {{applicant_name}} at {{applicant_contact}}.</p>
<p>Yours truly,</p>
<p>{{applicant_name}}</p>"#;

const FILING: &str = r#"<p>{{letter_date}}</p>
<p>Probate Registry, {{registry}} Law Courts</p>
<p class="heading">Re: Application for {{grant_type}}, estate of {{deceased_name}}</p>
<p>Enclosed for filing please find the submission for estate grant and supporting affidavits, together with payment of the filing fee and probate fees.</p>
<p>The notices of proposed application were delivered on or before {{notices_mailed}}, and the 21-day waiting period has elapsed.</p>
<p>Please direct any requisitions to {{applicant_name}} at {{applicant_address}}.</p>
<p>Yours truly,</p>
<p>{{applicant_name}}</p>"#;

const WILL_SEARCH_REQUEST: &str = r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>Application for Search of Wills Notice</title>
<style>body{font-family:Helvetica,Arial,sans-serif;font-size:11pt;margin:2cm}th{text-align:left;width:40%}td,th{border-bottom:1px solid #999;padding:4px}table{width:100%;border-collapse:collapse}</style>
</head><body>
<h1>Application for Search of Wills Notice</h1>
<h2>Particulars of the deceased</h2>
<table>
<tr><th>Surname</th><td>{{deceased_last}}</td></tr>
<tr><th>Given names</th><td>{{deceased_given}}</td></tr>
<tr><th>Other names</th><td>{{deceased_other_names}}</td></tr>
<tr><th>Date of birth</th><td>{{date_of_birth}}</td></tr>
<tr><th>Date of death</th><td>{{date_of_death}}</td></tr>
<tr><th>Last address</th><td>{{deceased_address}}</td></tr>
</table>
<h2>Applicant</h2>
<table>
<tr><th>Name</th><td>{{applicant_name}}</td></tr>
<tr><th>Mailing address</th><td>{{applicant_address}}</td></tr>
<tr><th>Relationship to deceased</th><td>{{applicant_relationship}}</td></tr>
</table>
<p>Reference: {{case_code}}. Dated {{letter_date}}.</p>
</body></html>"#;

/// A rendered paragraph; `text` is already XML-escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub text: String,
    pub bold: bool,
}

/// Values not carried on the estate record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterContext {
    pub letter_date: NaiveDate,
    pub notices_mailed: Option<NaiveDate>,
}

pub fn template_for(kind: CoverLetterKind) -> &'static str {
    match kind {
        CoverLetterKind::WillSearch => WILL_SEARCH,
        CoverLetterKind::Notice => NOTICE,
        CoverLetterKind::Filing => FILING,
    }
}

pub fn letter_values(
    data: &NormalizedEstateData,
    context: LetterContext,
) -> BTreeMap<&'static str, String> {
    let applicant = data.primary_applicant();
    let applicant_name = applicant
        .map(|applicant| applicant.name.display())
        .unwrap_or_default();
    let applicant_address = applicant
        .map(|applicant| applicant.address.one_line())
        .unwrap_or_default();
    let applicant_contact = applicant
        .and_then(|applicant| applicant.email.clone().or_else(|| applicant.phone.clone()))
        .unwrap_or_else(|| applicant_address.clone());

    BTreeMap::from([
        ("letter_date", context.letter_date.format("%B %-d, %Y").to_string()),
        ("deceased_name", deceased_name(data)),
        (
            "date_of_death",
            data.estate.deceased.date_of_death.clone().unwrap_or_default(),
        ),
        ("applicant_name", applicant_name),
        ("applicant_names", applicant_names(data)),
        ("applicant_address", applicant_address),
        ("applicant_contact", applicant_contact),
        ("registry", data.estate.registry.clone().unwrap_or_default()),
        ("grant_type", data.estate.grant_type.label().to_string()),
        ("case_code", data.estate.case_code.clone().unwrap_or_default()),
        (
            "notices_mailed",
            context
                .notices_mailed
                .map(|date| date.format("%B %-d, %Y").to_string())
                .unwrap_or_default(),
        ),
    ])
}

/// Filled HTML for the wills notice search application.
pub fn will_search_request_html(data: &NormalizedEstateData, context: LetterContext) -> String {
    let deceased = &data.estate.deceased;
    let mut values = letter_values(data, context);
    let given = [deceased.name.first.as_str(), deceased.name.middle.as_str()]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    values.insert("deceased_last", deceased.name.last.clone());
    values.insert("deceased_given", given);
    values.insert(
        "deceased_other_names",
        deceased.other_names.clone().unwrap_or_default(),
    );
    values.insert(
        "date_of_birth",
        deceased.date_of_birth.clone().unwrap_or_default(),
    );
    values.insert("deceased_address", deceased.address.one_line());
    values.insert(
        "applicant_relationship",
        data.primary_applicant()
            .and_then(|applicant| applicant.relationship.clone())
            .unwrap_or_default(),
    );
    fill_template(WILL_SEARCH_REQUEST, &values)
}

/// Replace `{{name}}` placeholders with XML-escaped values. Unknown names render empty.
pub fn fill_template(template: &str, values: &BTreeMap<&str, String>) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            output.push_str(&rest[start..]);
            return output;
        };
        let key = after[..end].trim();
        if let Some(value) = values.get(key) {
            output.push_str(&escape_xml(value));
        }
        rest = &after[end + 2..];
    }
    output.push_str(rest);
    output
}

/// Split filled template markup into paragraphs. `<p class="heading">` marks bold lines.
pub fn paragraphs(markup: &str) -> Vec<Paragraph> {
    markup
        .split("</p>")
        .filter_map(|chunk| {
            let chunk = chunk.trim();
            let open = chunk.find("<p")?;
            let body_start = open + chunk[open..].find('>')? + 1;
            let tag = &chunk[open..body_start];
            Some(Paragraph {
                text: chunk[body_start..].trim().to_string(),
                bold: tag.contains("class=\"heading\""),
            })
        })
        .collect()
}

pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
