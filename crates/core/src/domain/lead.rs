use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub Uuid);

impl LeadId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Travel,
    Health,
    General,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Health => "health",
            Self::General => "general",
        }
    }
}

impl std::str::FromStr for Intent {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "travel" => Ok(Self::Travel),
            "health" => Ok(Self::Health),
            "general" => Ok(Self::General),
            other => Err(DomainError::UnknownIntent(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    New,
    Qualified,
    CollectingDetails,
    QuoteReady,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Qualified => "qualified",
            Self::CollectingDetails => "collecting_details",
            Self::QuoteReady => "quote_ready",
        }
    }
}

impl std::str::FromStr for Stage {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "new" => Ok(Self::New),
            "qualified" => Ok(Self::Qualified),
            "collecting_details" => Ok(Self::CollectingDetails),
            "quote_ready" => Ok(Self::QuoteReady),
            other => Err(DomainError::UnknownStage(other.to_string())),
        }
    }
}

/// Required details for a travel lead, in asking priority order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelSlots {
    pub destination: Option<String>,
    pub travel_date: Option<String>,
    pub passengers: Option<String>,
}

impl TravelSlots {
    pub fn is_complete(&self) -> bool {
        self.destination.is_some() && self.travel_date.is_some() && self.passengers.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.destination.is_none() && self.travel_date.is_none() && self.passengers.is_none()
    }

    /// First unset slot in the fixed priority order, if any.
    pub fn next_missing(&self) -> Option<SlotName> {
        if self.destination.is_none() {
            Some(SlotName::Destination)
        } else if self.travel_date.is_none() {
            Some(SlotName::TravelDate)
        } else if self.passengers.is_none() {
            Some(SlotName::Passengers)
        } else {
            None
        }
    }

    /// Fills only slots that are still unset, skipping empty candidate
    /// values. Returns the names of slots that were actually written.
    pub fn merge_missing(&mut self, candidate: &TravelSlots) -> Vec<SlotName> {
        let mut filled = Vec::new();
        if self.destination.is_none() {
            if let Some(value) = non_empty(&candidate.destination) {
                self.destination = Some(value);
                filled.push(SlotName::Destination);
            }
        }
        if self.travel_date.is_none() {
            if let Some(value) = non_empty(&candidate.travel_date) {
                self.travel_date = Some(value);
                filled.push(SlotName::TravelDate);
            }
        }
        if self.passengers.is_none() {
            if let Some(value) = non_empty(&candidate.passengers) {
                self.passengers = Some(value);
                filled.push(SlotName::Passengers);
            }
        }
        filled
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    Destination,
    TravelDate,
    Passengers,
}

impl SlotName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Destination => "destination",
            Self::TravelDate => "travel_date",
            Self::Passengers => "passengers",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub contact: String,
    pub channel: String,
    pub intent: Option<Intent>,
    pub stage: Stage,
    pub slots: TravelSlots,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lead {
    pub fn new(contact: impl Into<String>, channel: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: LeadId::generate(),
            contact: contact.into(),
            channel: channel.into(),
            intent: None,
            stage: Stage::New,
            slots: TravelSlots::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the intent detected on the first meaningful message. The intent
    /// is write-once until a reset.
    pub fn qualify(&mut self, intent: Intent) -> Result<(), DomainError> {
        if let Some(existing) = self.intent {
            return Err(DomainError::IntentAlreadySet(existing));
        }
        self.intent = Some(intent);
        self.stage = Stage::Qualified;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Merges extracted values into unset slots and advances the stage.
    /// Already-filled slots are never overwritten, and the stage only moves
    /// forward. Returns the slots that were written this turn.
    pub fn absorb_slots(&mut self, candidate: &TravelSlots) -> Vec<SlotName> {
        let filled = self.slots.merge_missing(candidate);
        self.advance_stage();
        if !filled.is_empty() {
            self.updated_at = Utc::now();
        }
        filled
    }

    /// Recomputes the stage from slot completeness without ever regressing.
    pub fn advance_stage(&mut self) {
        if self.intent != Some(Intent::Travel) {
            return;
        }
        let computed =
            if self.slots.is_complete() { Stage::QuoteReady } else { Stage::CollectingDetails };
        if computed > self.stage {
            self.stage = computed;
        }
    }

    /// Clears intent, slots, and stage back to a fresh lead. The identity
    /// and channel survive so the contact can start over.
    pub fn reset(&mut self) {
        self.intent = None;
        self.stage = Stage::New;
        self.slots = TravelSlots::default();
        self.updated_at = Utc::now();
    }

    /// Holds when the stage/slot invariant is intact: `QuoteReady` exactly
    /// when all required slots are filled, and no intent only in `New`.
    pub fn invariants_hold(&self) -> bool {
        let quote_ready_ok = (self.stage == Stage::QuoteReady) == self.slots.is_complete();
        let intent_ok = self.intent.is_some() || self.stage == Stage::New;
        quote_ready_ok && intent_ok
    }
}
