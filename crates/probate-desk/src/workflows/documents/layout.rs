use rust_decimal::Decimal;
use std::str::FromStr;

use super::catalog::FormId;
use crate::workflows::estate::{Applicant, Beneficiary, GrantType, NormalizedEstateData};
use crate::workflows::fees::{format_money, FeeSchedule};

const COURT: &str = "IN THE SUPREME COURT OF BRITISH COLUMBIA";
const NOT_PROVIDED: &str = "[not provided]";

/// Printable content of a structured form, independent of the output format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormContent {
    pub form: FormId,
    pub title: String,
    pub caption: Vec<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: Option<String>,
    pub paragraphs: Vec<String>,
}

impl Section {
    fn titled(heading: impl Into<String>) -> Self {
        Self {
            heading: Some(heading.into()),
            paragraphs: Vec::new(),
        }
    }

    fn untitled() -> Self {
        Self {
            heading: None,
            paragraphs: Vec::new(),
        }
    }

    fn line(mut self, text: impl Into<String>) -> Self {
        self.paragraphs.push(text.into());
        self
    }

    fn lines(mut self, texts: impl IntoIterator<Item = String>) -> Self {
        self.paragraphs.extend(texts);
        self
    }
}

/// Lay out a court form. Callers validate first; gaps that survive validation print as
/// `[not provided]` instead of being dropped.
pub fn build_form_content(
    form: FormId,
    data: &NormalizedEstateData,
    fees: &FeeSchedule,
) -> FormContent {
    let sections = match form {
        FormId::P1 => notice_of_proposed_application(data),
        FormId::P2 => submission_for_grant(data),
        FormId::P3 => applicant_affidavit(data, false),
        FormId::P4 => applicant_affidavit(data, true),
        FormId::P8 => affidavit_in_support(data),
        FormId::P9 => affidavit_of_delivery(data),
        FormId::P10 => assets_and_liabilities(data, fees),
        _ => vec![Section::untitled().line(format!(
            "{} is not produced as a structured form.",
            form.title()
        ))],
    };

    FormContent {
        form,
        title: form.title().to_string(),
        caption: caption(data),
        sections,
    }
}

fn caption(data: &NormalizedEstateData) -> Vec<String> {
    let registry = data.estate.registry.as_deref().unwrap_or(NOT_PROVIDED);
    vec![
        COURT.to_string(),
        format!("{registry} Registry"),
        format!(
            "In the Matter of the Estate of {}, deceased",
            deceased_name(data)
        ),
    ]
}

fn notice_of_proposed_application(data: &NormalizedEstateData) -> Vec<Section> {
    let grant = data.estate.grant_type.label();
    let registry = data.estate.registry.as_deref().unwrap_or(NOT_PROVIDED);

    let notice = Section::titled("Take notice that")
        .line(format!(
            "1. {} propose(s) to apply, in the {registry} court registry, for a {grant} in \
             relation to the estate of {}, who died on {}.",
            applicant_names(data),
            deceased_name(data),
            text_or_gap(data.estate.deceased.date_of_death.as_deref()),
        ))
        .line(
            "2. You may file a notice of dispute with the registry before the grant is issued. \
             The application will not be submitted until at least 21 days after this notice is \
             delivered.",
        );

    let recipients = Section::titled("Persons to whom this notice is delivered").lines(
        data.estate
            .beneficiaries
            .iter()
            .enumerate()
            .map(|(index, beneficiary)| beneficiary_line(index, beneficiary)),
    );

    let mut sections = vec![notice, recipients];
    if data.estate.grant_type == GrantType::Probate {
        sections.push(Section::titled("Will").line(format!(
            "The will of the deceased is dated {}.",
            text_or_gap(data.estate.will_date.as_deref())
        )));
    }
    sections.push(applicant_contacts(data));
    sections
}

fn submission_for_grant(data: &NormalizedEstateData) -> Vec<Section> {
    let deceased = &data.estate.deceased;
    let particulars = Section::titled("Part 1: Particulars of the deceased")
        .line(format!("Full legal name: {}", deceased_name(data)))
        .line(format!(
            "Other names: {}",
            deceased.other_names.as_deref().unwrap_or("none")
        ))
        .line(format!("Last residential address: {}", address_or_gap(&deceased.address.one_line())))
        .line(format!(
            "Date of birth: {}",
            text_or_gap(deceased.date_of_birth.as_deref())
        ))
        .line(format!(
            "Date of death: {}",
            text_or_gap(deceased.date_of_death.as_deref())
        ));

    let relief = Section::titled("Part 2: Relief sought").line(format!(
        "The applicant(s) apply for a {}.",
        data.estate.grant_type.label()
    ));

    let documents = Section::titled("Part 3: Documents filed").lines(
        supporting_forms(data.estate.grant_type)
            .iter()
            .map(|form| format!("{}: {}", form.code().to_ascii_uppercase(), form.title())),
    );

    vec![particulars, relief, documents, applicant_contacts(data)]
}

fn applicant_affidavit(data: &NormalizedEstateData, long_form: bool) -> Vec<Section> {
    let deponent = data.primary_applicant();
    let opening = Section::untitled().line(format!(
        "I, {}, of {}, SWEAR OR AFFIRM THAT:",
        deponent
            .map(|applicant| applicant.name.display())
            .unwrap_or_else(|| NOT_PROVIDED.to_string()),
        deponent
            .map(|applicant| address_or_gap(&applicant.address.one_line()))
            .unwrap_or_else(|| NOT_PROVIDED.to_string()),
    ));

    let mut paragraphs = vec![
        format!(
            "1. I am an executor named in the will of the deceased dated {}.",
            text_or_gap(data.estate.will_date.as_deref())
        ),
        format!(
            "2. The deceased, {}, died on {}.",
            deceased_name(data),
            text_or_gap(data.estate.deceased.date_of_death.as_deref())
        ),
        "3. I have made diligent search for a testamentary document of the deceased and none \
         later than the will has been found."
            .to_string(),
        "4. I will administer the estate according to law and render a true account of my \
         administration when required."
            .to_string(),
    ];

    if long_form {
        let others: Vec<String> = data
            .estate
            .applicants
            .iter()
            .filter(|applicant| !applicant.flags.primary)
            .map(other_executor_line)
            .collect();
        if others.is_empty() {
            paragraphs.push("5. No other person is named as executor in the will.".to_string());
        } else {
            paragraphs.push(format!(
                "5. The other persons named as executor are: {}.",
                others.join("; ")
            ));
        }
    }

    vec![opening, Section::untitled().lines(paragraphs), jurat()]
}

fn affidavit_in_support(data: &NormalizedEstateData) -> Vec<Section> {
    let grant = data.estate.grant_type;
    let mut section = Section::untitled()
        .line(format!(
            "1. I am an applicant for a {} in the estate of {}.",
            grant.label(),
            deceased_name(data)
        ))
        .line(format!(
            "2. The deceased was ordinarily resident in British Columbia at {}.",
            address_or_gap(&data.estate.deceased.address.one_line())
        ));

    section = match grant {
        GrantType::Probate => section.line(format!(
            "3. Attached as Exhibit A is the will of the deceased dated {}.",
            text_or_gap(data.estate.will_date.as_deref())
        )),
        GrantType::Administration => section.line(
            "3. I have searched for a will of the deceased and believe the deceased died \
             without a will.",
        ),
    };

    if let Some(occupation) = data.estate.deceased.occupation.as_deref() {
        section = section.line(format!("4. The deceased's occupation was {occupation}."));
    }

    vec![section, jurat()]
}

fn affidavit_of_delivery(data: &NormalizedEstateData) -> Vec<Section> {
    let delivered = Section::titled("Delivery of notice").line(
        "1. I delivered a copy of the notice of proposed application in Form P1, together with \
         the documents required, to each of the following persons:",
    );
    let recipients = Section::untitled().lines(
        data.estate
            .beneficiaries
            .iter()
            .enumerate()
            .map(|(index, beneficiary)| beneficiary_line(index, beneficiary)),
    );
    vec![delivered, recipients, jurat()]
}

fn assets_and_liabilities(data: &NormalizedEstateData, fees: &FeeSchedule) -> Vec<Section> {
    let assets = Section::titled("Exhibit A: Property of the deceased").lines(
        data.estate.assets.iter().enumerate().map(|(index, asset)| {
            let kind = if asset.real_property {
                "real property"
            } else {
                "personal property"
            };
            let location = if asset.located_in_bc {
                "in British Columbia"
            } else {
                "outside British Columbia"
            };
            format!(
                "{}. {} ({kind}, {location}): {}",
                index + 1,
                asset.description,
                money_or_gap(asset.value.as_deref())
            )
        }),
    );

    let liabilities = Section::titled("Liabilities").lines(
        data.estate
            .liabilities
            .iter()
            .enumerate()
            .map(|(index, liability)| {
                format!(
                    "{}. {}: {}",
                    index + 1,
                    liability.description,
                    money_or_gap(liability.amount.as_deref())
                )
            }),
    );

    let breakdown = fees.calculate(data.gross_value);
    let summary = Section::titled("Summary")
        .line(format!("Gross value of the estate: {}", format_money(data.gross_value)))
        .line(format!("Total liabilities: {}", format_money(data.total_liabilities)))
        .line(format!("Net value of the estate: {}", format_money(data.net_value())))
        .lines(breakdown.brackets.iter().map(|bracket| {
            format!(
                "Probate fee, {}: {} ({})",
                bracket.label,
                format_money(bracket.amount),
                bracket.detail
            )
        }))
        .line(format!("Filing fee: {}", format_money(breakdown.filing_fee)))
        .line(format!("Total court fees payable: {}", format_money(breakdown.total)));

    vec![assets, liabilities, summary, jurat()]
}

fn applicant_contacts(data: &NormalizedEstateData) -> Section {
    Section::titled("Applicant contact information").lines(data.acting_applicants().map(
        |applicant| {
            let mut line = format!(
                "{}, {}",
                applicant.name.display(),
                address_or_gap(&applicant.address.one_line())
            );
            if let Some(email) = applicant.email.as_deref() {
                line.push_str(&format!(", {email}"));
            }
            if let Some(phone) = applicant.phone.as_deref() {
                line.push_str(&format!(", {phone}"));
            }
            line
        },
    ))
}

fn jurat() -> Section {
    Section::titled("Sworn (or affirmed) before me")
        .line("at ____________________, British Columbia, on ____________________.")
        .line("______________________________    ______________________________")
        .line("A commissioner for taking affidavits    Signature of deponent")
}

fn supporting_forms(grant: GrantType) -> &'static [FormId] {
    match grant {
        GrantType::Probate => &[FormId::P3, FormId::P8, FormId::P9, FormId::P10],
        GrantType::Administration => &[FormId::P8, FormId::P9, FormId::P10],
    }
}

fn beneficiary_line(index: usize, beneficiary: &Beneficiary) -> String {
    let mut line = format!(
        "{}. {}, {}",
        index + 1,
        beneficiary.display_name(),
        address_or_gap(&beneficiary.address().one_line())
    );
    if let Beneficiary::Person {
        relationship,
        status,
        minor,
        ..
    } = beneficiary
    {
        if let Some(relationship) = relationship.as_deref() {
            line.push_str(&format!(" ({relationship})"));
        }
        if *minor {
            line.push_str(", a minor");
        }
        if !matches!(status, crate::workflows::estate::BeneficiaryStatus::Active) {
            line.push_str(&format!(", {}", status.label()));
        }
    }
    line
}

fn other_executor_line(applicant: &Applicant) -> String {
    let name = applicant.name.display();
    if applicant.flags.renouncing {
        format!("{name}, who has renounced")
    } else if applicant.flags.deceased {
        format!("{name}, who has died")
    } else if applicant.flags.minor {
        format!("{name}, who is a minor")
    } else {
        format!("{name}, who is applying jointly")
    }
}

pub(crate) fn deceased_name(data: &NormalizedEstateData) -> String {
    let name = data.estate.deceased.name.display();
    if name.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        name
    }
}

pub(crate) fn applicant_names(data: &NormalizedEstateData) -> String {
    let names: Vec<String> = data
        .acting_applicants()
        .map(|applicant| applicant.name.display())
        .collect();
    if names.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        names.join(" and ")
    }
}

fn text_or_gap(value: Option<&str>) -> String {
    value.unwrap_or(NOT_PROVIDED).to_string()
}

fn address_or_gap(address: &str) -> String {
    if address.is_empty() {
        NOT_PROVIDED.to_string()
    } else {
        address.to_string()
    }
}

fn money_or_gap(value: Option<&str>) -> String {
    value
        .and_then(|raw| Decimal::from_str(raw).ok())
        .map(format_money)
        .unwrap_or_else(|| NOT_PROVIDED.to_string())
}
