use chrono::{DateTime, NaiveDate, Utc};
use common::errors::AppError;
use common::models::{
    CreateEventRequest, Event, EventListResponse, Pagination, UpdateEventRequest,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

/// Event categories accepted on create and update
pub const EVENT_TYPES: [&str; 7] = [
    "outdoor sports",
    "wedding",
    "hiking",
    "corporate",
    "festival",
    "picnic",
    "concert",
];

const DEFAULT_DURATION_HOURS: u32 = 4;
const DEFAULT_PAGE_SIZE: usize = 10;

/// List filters; text filters are case-insensitive substring matches
#[derive(Debug, Default, Deserialize)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub location: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// JSON-file-backed event repository.
///
/// The file holds a single array and is rewritten on every mutation. Mutations
/// are applied to a copy and only become visible once the copy is on disk.
pub struct EventStore {
    path: PathBuf,
    events: RwLock<Vec<Event>>,
}

impl EventStore {
    /// Load the store, creating an empty file if none exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let events = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                AppError::storage(format!("Corrupt event file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, b"[]").await?;
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        info!(path = %path.display(), count = events.len(), "Event store opened");

        Ok(Self {
            path,
            events: RwLock::new(events),
        })
    }

    fn staging_path(&self) -> PathBuf {
        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        PathBuf::from(staging)
    }

    /// Write to a sibling file and rename it over the store
    async fn persist(&self, events: &[Event]) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(events)
            .map_err(|e| AppError::storage(format!("Failed to serialise events: {}", e)))?;

        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        if let Err(e) = tokio::fs::rename(&staging, &self.path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        Ok(())
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create(
        &self,
        request: CreateEventRequest,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        validate_create(&request, now.date_naive())?;

        let event = Event {
            id: Uuid::new_v4(),
            name: request.name,
            location: request.location,
            date: request.date,
            event_type: request.event_type,
            description: request.description.unwrap_or_default(),
            duration: request.duration.unwrap_or(DEFAULT_DURATION_HOURS),
            participants: request.participants.unwrap_or(1),
            requirements: request.requirements.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        };

        let mut events = self.events.write().await;
        let mut next = events.clone();
        next.push(event.clone());
        self.persist(&next).await?;
        *events = next;

        info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    pub async fn list(&self, filter: &EventFilter) -> EventListResponse {
        let events = self.events.read().await;

        let type_filter = filter.event_type.as_deref().map(str::to_lowercase);
        let location_filter = filter.location.as_deref().map(str::to_lowercase);
        let matching: Vec<&Event> = events
            .iter()
            .filter(|e| {
                type_filter
                    .as_ref()
                    .is_none_or(|t| e.event_type.to_lowercase().contains(t.as_str()))
            })
            .filter(|e| {
                location_filter
                    .as_ref()
                    .is_none_or(|l| e.location.to_lowercase().contains(l.as_str()))
            })
            .collect();

        let page = filter.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = filter.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE);
        let start = (page - 1).saturating_mul(limit);
        let end = start.saturating_add(limit);
        let total = matching.len();

        EventListResponse {
            events: matching
                .into_iter()
                .skip(start)
                .take(limit)
                .cloned()
                .collect(),
            pagination: Pagination {
                current_page: page,
                total_pages: total.div_ceil(limit),
                total_events: total,
                has_next: end < total,
                has_prev: start > 0,
            },
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<Event, AppError> {
        let events = self.events.read().await;
        events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Event {}", id)))
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: Uuid,
        update: UpdateEventRequest,
        now: DateTime<Utc>,
    ) -> Result<Event, AppError> {
        validate_update(&update, now.date_naive())?;

        let mut events = self.events.write().await;
        let mut next = events.clone();
        let event = next
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| AppError::not_found(format!("Event {}", id)))?;

        if let Some(name) = update.name {
            event.name = name;
        }
        if let Some(location) = update.location {
            event.location = location;
        }
        if let Some(date) = update.date {
            event.date = date;
        }
        if let Some(event_type) = update.event_type {
            event.event_type = event_type;
        }
        if let Some(description) = update.description {
            event.description = description;
        }
        if let Some(duration) = update.duration {
            event.duration = duration;
        }
        if let Some(participants) = update.participants {
            event.participants = participants;
        }
        if let Some(requirements) = update.requirements {
            event.requirements = requirements;
        }
        event.updated_at = now;

        let updated = event.clone();
        self.persist(&next).await?;
        *events = next;

        info!(event_id = %id, "Event updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut events = self.events.write().await;
        let index = events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AppError::not_found(format!("Event {}", id)))?;

        let mut next = events.clone();
        next.remove(index);
        self.persist(&next).await?;
        *events = next;

        info!(event_id = %id, "Event deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    match name.trim().chars().count() {
        3..=100 => Ok(()),
        _ => Err(AppError::validation(
            "Event name must be between 3 and 100 characters",
        )),
    }
}

fn validate_location(location: &str) -> Result<(), AppError> {
    match location.trim().chars().count() {
        2..=100 => Ok(()),
        _ => Err(AppError::validation(
            "Location must be between 2 and 100 characters",
        )),
    }
}

fn validate_date(date: NaiveDate, today: NaiveDate) -> Result<(), AppError> {
    if date < today {
        return Err(AppError::validation("Event date cannot be in the past"));
    }
    Ok(())
}

fn validate_event_type(event_type: &str) -> Result<(), AppError> {
    if !EVENT_TYPES.contains(&event_type) {
        return Err(AppError::validation(format!(
            "Invalid event type '{}', expected one of: {}",
            event_type,
            EVENT_TYPES.join(", ")
        )));
    }
    Ok(())
}

fn validate_duration(duration: u32) -> Result<(), AppError> {
    if !(1..=24).contains(&duration) {
        return Err(AppError::validation(
            "Duration must be between 1 and 24 hours",
        ));
    }
    Ok(())
}

fn validate_participants(participants: u32) -> Result<(), AppError> {
    if participants < 1 {
        return Err(AppError::validation("Participants must be at least 1"));
    }
    Ok(())
}

pub fn validate_create(request: &CreateEventRequest, today: NaiveDate) -> Result<(), AppError> {
    validate_name(&request.name)?;
    validate_location(&request.location)?;
    validate_date(request.date, today)?;
    validate_event_type(&request.event_type)?;
    request.duration.map(validate_duration).transpose()?;
    request.participants.map(validate_participants).transpose()?;
    Ok(())
}

pub fn validate_update(update: &UpdateEventRequest, today: NaiveDate) -> Result<(), AppError> {
    update.name.as_deref().map(validate_name).transpose()?;
    update.location.as_deref().map(validate_location).transpose()?;
    update.date.map(|d| validate_date(d, today)).transpose()?;
    update.event_type.as_deref().map(validate_event_type).transpose()?;
    update.duration.map(validate_duration).transpose()?;
    update.participants.map(validate_participants).transpose()?;
    Ok(())
}
