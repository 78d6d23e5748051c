use serde::{Deserialize, Serialize};

/// Every document identifier the portal knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormId {
    P1,
    P2,
    P3,
    P4,
    P5,
    P8,
    P9,
    P10,
    P11,
    CoverLetterWillSearch,
    CoverLetterNotice,
    CoverLetterFiling,
    WillSearchRequest,
}

impl FormId {
    pub const fn all() -> [Self; 13] {
        [
            Self::P1,
            Self::P2,
            Self::P3,
            Self::P4,
            Self::P5,
            Self::P8,
            Self::P9,
            Self::P10,
            Self::P11,
            Self::CoverLetterWillSearch,
            Self::CoverLetterNotice,
            Self::CoverLetterFiling,
            Self::WillSearchRequest,
        ]
    }

    /// Case-insensitive lookup by code ("p1", "cover-letter-notice", "will_search_request").
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_ascii_lowercase().replace('-', "_");
        Self::all().into_iter().find(|form| form.code() == key)
    }

    pub const fn code(self) -> &'static str {
        match self {
            Self::P1 => "p1",
            Self::P2 => "p2",
            Self::P3 => "p3",
            Self::P4 => "p4",
            Self::P5 => "p5",
            Self::P8 => "p8",
            Self::P9 => "p9",
            Self::P10 => "p10",
            Self::P11 => "p11",
            Self::CoverLetterWillSearch => "cover_letter_will_search",
            Self::CoverLetterNotice => "cover_letter_notice",
            Self::CoverLetterFiling => "cover_letter_filing",
            Self::WillSearchRequest => "will_search_request",
        }
    }

    pub const fn title(self) -> &'static str {
        match self {
            Self::P1 => "Notice of Proposed Application in Form P1",
            Self::P2 => "Submission for Estate Grant",
            Self::P3 => "Affidavit of Applicant for Grant of Probate (Short Form)",
            Self::P4 => "Affidavit of Applicant for Grant of Probate (Long Form)",
            Self::P5 => "Affidavit of Applicant for Grant of Administration with Will Annexed",
            Self::P8 => "Affidavit in Support of Application for Estate Grant",
            Self::P9 => "Affidavit of Delivery",
            Self::P10 => "Affidavit of Assets and Liabilities for Domiciled Estate Grant",
            Self::P11 => "Affidavit of Assets and Liabilities for Non-Domiciled Estate Grant",
            Self::CoverLetterWillSearch => "Will Search Cover Letter",
            Self::CoverLetterNotice => "Notice Package Cover Letter",
            Self::CoverLetterFiling => "Registry Filing Cover Letter",
            Self::WillSearchRequest => "Wills Notice Search Request",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverLetterKind {
    WillSearch,
    Notice,
    Filing,
}

/// Which generation strategy serves a form, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FormAvailability {
    StructuredPdf,
    CoverLetterDocx { kind: CoverLetterKind },
    BrowserRendered,
    NotAvailable,
}

pub fn availability(form: FormId) -> FormAvailability {
    match form {
        FormId::P1
        | FormId::P2
        | FormId::P3
        | FormId::P4
        | FormId::P8
        | FormId::P9
        | FormId::P10 => {
            FormAvailability::StructuredPdf
        }
        FormId::CoverLetterWillSearch => FormAvailability::CoverLetterDocx {
            kind: CoverLetterKind::WillSearch,
        },
        FormId::CoverLetterNotice => FormAvailability::CoverLetterDocx {
            kind: CoverLetterKind::Notice,
        },
        FormId::CoverLetterFiling => FormAvailability::CoverLetterDocx {
            kind: CoverLetterKind::Filing,
        },
        FormId::WillSearchRequest => FormAvailability::BrowserRendered,
        FormId::P5 | FormId::P11 => FormAvailability::NotAvailable,
    }
}

pub fn is_form_available(form: FormId) -> bool {
    !matches!(availability(form), FormAvailability::NotAvailable)
}
