//! Mapping from business events to the workflow steps they auto-complete.
//!
//! Each trigger names an action, optionally a specific event, the data
//! fields that must be present, and an extra condition. When an event
//! arrives the tracker consults [`triggered_steps`] and completes every
//! matching step that is still open.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::StepNumber;

/// Kind of business action reported by an upstream system or operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TriggerAction {
    Create,
    Update,
    Upload,
    Submit,
    Approve,
    Payment,
    Calculate,
}

impl TriggerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerAction::Create => "create",
            TriggerAction::Update => "update",
            TriggerAction::Upload => "upload",
            TriggerAction::Submit => "submit",
            TriggerAction::Approve => "approve",
            TriggerAction::Payment => "payment",
            TriggerAction::Calculate => "calculate",
        }
    }
}

impl fmt::Display for TriggerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "create" => Ok(TriggerAction::Create),
            "update" => Ok(TriggerAction::Update),
            "upload" => Ok(TriggerAction::Upload),
            "submit" => Ok(TriggerAction::Submit),
            "approve" => Ok(TriggerAction::Approve),
            "payment" => Ok(TriggerAction::Payment),
            "calculate" => Ok(TriggerAction::Calculate),
            _ => Err(format!("Invalid trigger action: {s}")),
        }
    }
}

/// Named events the trigger table distinguishes within an action.
/// Closed set; unknown event strings never fire anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentEvent {
    ProformaInvoice,
    ShippingDocuments,
    CommercialInvoice,
    PackingList,
    CertificateOfOrigin,
    BillOfLading,
    InsurancePolicy,
    BankDocuments,
    BayanSubmission,
    BayanApproval,
    DoRequest,
    PortArrival,
    VesselDischarge,
    CustomsDuty,
    Vat,
    DoPayment,
    InsurancePremium,
    FundTransfer,
}

impl DocumentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentEvent::ProformaInvoice => "proforma-invoice",
            DocumentEvent::ShippingDocuments => "shipping-documents",
            DocumentEvent::CommercialInvoice => "commercial-invoice",
            DocumentEvent::PackingList => "packing-list",
            DocumentEvent::CertificateOfOrigin => "certificate-of-origin",
            DocumentEvent::BillOfLading => "bill-of-lading",
            DocumentEvent::InsurancePolicy => "insurance-policy",
            DocumentEvent::BankDocuments => "bank-documents",
            DocumentEvent::BayanSubmission => "bayan-submission",
            DocumentEvent::BayanApproval => "bayan-approval",
            DocumentEvent::DoRequest => "do-request",
            DocumentEvent::PortArrival => "port-arrival",
            DocumentEvent::VesselDischarge => "vessel-discharge",
            DocumentEvent::CustomsDuty => "customs-duty",
            DocumentEvent::Vat => "vat",
            DocumentEvent::DoPayment => "do-payment",
            DocumentEvent::InsurancePremium => "insurance-premium",
            DocumentEvent::FundTransfer => "fund-transfer",
        }
    }

    /// The step this event drives.
    pub fn step(&self) -> StepNumber {
        match self {
            DocumentEvent::ProformaInvoice => StepNumber::new(1, 3),
            DocumentEvent::ShippingDocuments => StepNumber::new(1, 4),
            DocumentEvent::CommercialInvoice => StepNumber::new(2, 1),
            DocumentEvent::PackingList => StepNumber::new(2, 2),
            DocumentEvent::CertificateOfOrigin => StepNumber::new(2, 3),
            DocumentEvent::BillOfLading => StepNumber::new(2, 4),
            DocumentEvent::InsurancePolicy => StepNumber::new(5, 1),
            DocumentEvent::BankDocuments => StepNumber::new(6, 1),
            DocumentEvent::BayanSubmission => StepNumber::new(9, 0),
            DocumentEvent::BayanApproval => StepNumber::new(9, 2),
            DocumentEvent::DoRequest => StepNumber::new(7, 0),
            DocumentEvent::PortArrival => StepNumber::new(7, 1),
            DocumentEvent::VesselDischarge => StepNumber::new(8, 0),
            DocumentEvent::CustomsDuty => StepNumber::new(10, 0),
            DocumentEvent::Vat => StepNumber::new(10, 1),
            DocumentEvent::DoPayment => StepNumber::new(10, 2),
            DocumentEvent::InsurancePremium => StepNumber::new(5, 2),
            DocumentEvent::FundTransfer => StepNumber::new(4, 1),
        }
    }
}

impl fmt::Display for DocumentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proforma-invoice" => Ok(DocumentEvent::ProformaInvoice),
            "shipping-documents" => Ok(DocumentEvent::ShippingDocuments),
            "commercial-invoice" => Ok(DocumentEvent::CommercialInvoice),
            "packing-list" => Ok(DocumentEvent::PackingList),
            "certificate-of-origin" => Ok(DocumentEvent::CertificateOfOrigin),
            "bill-of-lading" => Ok(DocumentEvent::BillOfLading),
            "insurance-policy" => Ok(DocumentEvent::InsurancePolicy),
            "bank-documents" => Ok(DocumentEvent::BankDocuments),
            "bayan-submission" => Ok(DocumentEvent::BayanSubmission),
            "bayan-approval" => Ok(DocumentEvent::BayanApproval),
            "do-request" => Ok(DocumentEvent::DoRequest),
            "port-arrival" => Ok(DocumentEvent::PortArrival),
            "vessel-discharge" => Ok(DocumentEvent::VesselDischarge),
            "customs-duty" => Ok(DocumentEvent::CustomsDuty),
            "vat" => Ok(DocumentEvent::Vat),
            "do-payment" => Ok(DocumentEvent::DoPayment),
            "insurance-premium" => Ok(DocumentEvent::InsurancePremium),
            "fund-transfer" => Ok(DocumentEvent::FundTransfer),
            _ => Err(format!("Unknown event: {s}")),
        }
    }
}

/// One row of the automation table.
pub struct AutomationTrigger {
    pub step: StepNumber,
    pub action: TriggerAction,
    /// When set, the event payload's `event` field must match exactly
    pub event: Option<DocumentEvent>,
    /// Fields that must be present and non-empty in the payload
    pub required_fields: &'static [&'static str],
    /// Extra predicate over the payload
    pub condition: Option<fn(&Map<String, Value>) -> bool>,
}

fn approved_is_true(data: &Map<String, Value>) -> bool {
    data.get("approved").and_then(Value::as_bool) == Some(true)
}

const fn sn(major: u8, minor: u8) -> StepNumber {
    StepNumber::new(major, minor)
}

/// The full automation table. A single action can drive several steps;
/// `create` completes both registration steps at once.
pub static TRIGGERS: &[AutomationTrigger] = &[
    AutomationTrigger {
        step: sn(1, 1),
        action: TriggerAction::Create,
        event: None,
        required_fields: &["principal", "brand"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(1, 2),
        action: TriggerAction::Create,
        event: None,
        required_fields: &["principal", "brand"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(1, 3),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::ProformaInvoice),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(1, 4),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::ShippingDocuments),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(2, 1),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::CommercialInvoice),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(2, 2),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::PackingList),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(2, 3),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::CertificateOfOrigin),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(2, 4),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::BillOfLading),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(3, 1),
        action: TriggerAction::Calculate,
        event: None,
        required_fields: &["invoice_amount"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(3, 2),
        action: TriggerAction::Approve,
        event: None,
        required_fields: &["approved_by"],
        condition: Some(approved_is_true),
    },
    AutomationTrigger {
        step: sn(4, 1),
        action: TriggerAction::Payment,
        event: Some(DocumentEvent::FundTransfer),
        required_fields: &["payment_reference"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(5, 1),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::InsurancePolicy),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(5, 2),
        action: TriggerAction::Payment,
        event: Some(DocumentEvent::InsurancePremium),
        required_fields: &["payment_reference"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(6, 1),
        action: TriggerAction::Upload,
        event: Some(DocumentEvent::BankDocuments),
        required_fields: &["document_ref"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(7, 0),
        action: TriggerAction::Submit,
        event: Some(DocumentEvent::DoRequest),
        required_fields: &[],
        condition: None,
    },
    AutomationTrigger {
        step: sn(7, 1),
        action: TriggerAction::Update,
        event: Some(DocumentEvent::PortArrival),
        required_fields: &[],
        condition: None,
    },
    AutomationTrigger {
        step: sn(8, 0),
        action: TriggerAction::Update,
        event: Some(DocumentEvent::VesselDischarge),
        required_fields: &[],
        condition: None,
    },
    AutomationTrigger {
        step: sn(9, 0),
        action: TriggerAction::Submit,
        event: Some(DocumentEvent::BayanSubmission),
        required_fields: &["bayan_number"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(9, 2),
        action: TriggerAction::Approve,
        event: Some(DocumentEvent::BayanApproval),
        required_fields: &[],
        condition: None,
    },
    AutomationTrigger {
        step: sn(10, 0),
        action: TriggerAction::Payment,
        event: Some(DocumentEvent::CustomsDuty),
        required_fields: &["payment_reference"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(10, 1),
        action: TriggerAction::Payment,
        event: Some(DocumentEvent::Vat),
        required_fields: &["payment_reference"],
        condition: None,
    },
    AutomationTrigger {
        step: sn(10, 2),
        action: TriggerAction::Payment,
        event: Some(DocumentEvent::DoPayment),
        required_fields: &["payment_reference"],
        condition: None,
    },
];

fn field_present(data: &Map<String, Value>, field: &str) -> bool {
    match data.get(field) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn trigger_matches(
    trigger: &AutomationTrigger,
    action: TriggerAction,
    data: &Map<String, Value>,
) -> bool {
    if trigger.action != action {
        return false;
    }
    if let Some(event) = trigger.event {
        let named = data
            .get("event")
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<DocumentEvent>().ok());
        if named != Some(event) {
            return false;
        }
    }
    if !trigger
        .required_fields
        .iter()
        .all(|field| field_present(data, field))
    {
        return false;
    }
    trigger.condition.map_or(true, |cond| cond(data))
}

/// Steps an action with this payload would auto-complete, in catalog order.
pub fn triggered_steps(action: TriggerAction, data: &Map<String, Value>) -> Vec<StepNumber> {
    TRIGGERS
        .iter()
        .filter(|t| trigger_matches(t, action, data))
        .map(|t| t.step)
        .collect()
}

/// Whether this payload satisfies some trigger for the given step.
pub fn can_auto_complete(step: StepNumber, action: TriggerAction, data: &Map<String, Value>) -> bool {
    TRIGGERS
        .iter()
        .any(|t| t.step == step && trigger_matches(t, action, data))
}

/// Human-readable note on how a step gets completed.
pub fn trigger_description(step: StepNumber) -> String {
    match TRIGGERS.iter().find(|t| t.step == step) {
        Some(trigger) => match trigger.event {
            Some(event) => format!("Auto-completed by {} event `{event}`", trigger.action),
            None => format!("Auto-completed by `{}` action", trigger.action),
        },
        None => "Manual completion required".to_string(),
    }
}
