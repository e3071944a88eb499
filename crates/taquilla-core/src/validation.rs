//! # Validation Module
//!
//! Input validation for queue and order requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP (serde)                                                 │
//! │  └── Shape of the JSON body                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any storage access)                      │
//! │  ├── identifiers present and bounded                                   │
//! │  ├── every line has ≥ 1 attendee                                       │
//! │  └── attendees unique across the whole order                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (client_id, queue_id) on turns                             │
//! │  ├── CHECK purchased_count <= capacity                                 │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::OrderRequest;
use crate::MAX_ID_LEN;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates an externally supplied identifier and returns it trimmed.
///
/// Services store and compare only the returned form, so `" evt-1"` and
/// `"evt-1"` name the same thing.
///
/// ## Example
/// ```rust
/// use taquilla_core::validation::validate_id;
///
/// assert_eq!(validate_id("client_id", " c-42 ").unwrap(), "c-42");
/// assert!(validate_id("client_id", "   ").is_err());
/// ```
pub fn validate_id<'a>(field: &str, value: &'a str) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(value)
}

/// Validates an order request before pricing or stock checks.
///
/// ## Rules
/// - `event_id` present
/// - at least one line
/// - every line names a zone and carries ≥ 1 attendee
/// - attendee ids are non-blank and unique across ALL lines
///
/// ## Example
/// ```rust
/// use taquilla_core::validation::validate_order_request;
/// use taquilla_core::{OrderLineRequest, OrderRequest};
///
/// let dup = OrderRequest {
///     event_id: "e1".into(),
///     lines: vec![OrderLineRequest {
///         zone_id: "z1".into(),
///         attendee_ids: vec!["111".into(), "111".into()],
///     }],
/// };
/// assert!(validate_order_request(&dup).is_err());
/// ```
pub fn validate_order_request(request: &OrderRequest) -> ValidationResult<()> {
    validate_id("event_id", &request.event_id)?;

    if request.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }

    let mut seen: HashSet<&str> = HashSet::new();

    for line in &request.lines {
        validate_id("zone_id", &line.zone_id)?;

        if line.attendee_ids.is_empty() {
            return Err(ValidationError::MustBePositive {
                field: format!("quantity for zone {}", line.zone_id),
            });
        }

        for attendee in &line.attendee_ids {
            let attendee = validate_id("attendee_id", attendee)?;

            if !seen.insert(attendee) {
                return Err(ValidationError::Duplicate {
                    field: "attendee_id".to_string(),
                    value: attendee.to_string(),
                });
            }
        }
    }

    Ok(())
}

/// Checks the per-client ticket limit for one event.
///
/// `held` are tickets the client already holds in pending or completed
/// orders; `requested` is the size of the new order.
pub fn check_ticket_limit(held: i64, requested: i64, limit: i64) -> CoreResult<()> {
    if held + requested > limit {
        return Err(CoreError::TicketLimitExceeded {
            held,
            requested,
            limit,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OrderLineRequest;

    fn line(zone: &str, attendees: &[&str]) -> OrderLineRequest {
        OrderLineRequest {
            zone_id: zone.to_string(),
            attendee_ids: attendees.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn request(lines: Vec<OrderLineRequest>) -> OrderRequest {
        OrderRequest {
            event_id: "e1".to_string(),
            lines,
        }
    }

    #[test]
    fn test_validate_id() {
        assert_eq!(validate_id("id", "abc").unwrap(), "abc");
        assert_eq!(validate_id("id", "\t abc \n").unwrap(), "abc");
        assert!(validate_id("id", "").is_err());
        assert!(validate_id("id", &"x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_valid_order() {
        let req = request(vec![line("z1", &["111", "222"]), line("z2", &["333"])]);
        assert!(validate_order_request(&req).is_ok());
    }

    #[test]
    fn test_duplicate_attendee_in_line() {
        let req = request(vec![line("z1", &["111", "111"])]);
        assert!(matches!(
            validate_order_request(&req),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_duplicate_attendee_across_lines() {
        let req = request(vec![line("z1", &["111"]), line("z2", &[" 111 "])]);
        assert!(matches!(
            validate_order_request(&req),
            Err(ValidationError::Duplicate { .. })
        ));
    }

    #[test]
    fn test_empty_order_and_empty_line() {
        assert!(matches!(
            validate_order_request(&request(vec![])),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_order_request(&request(vec![line("z1", &[])])),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_blank_attendee() {
        let req = request(vec![line("z1", &["111", " "])]);
        assert!(matches!(
            validate_order_request(&req),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_ticket_limit() {
        assert!(check_ticket_limit(0, 4, 4).is_ok());
        assert!(check_ticket_limit(2, 2, 4).is_ok());
        assert!(matches!(
            check_ticket_limit(3, 2, 4),
            Err(CoreError::TicketLimitExceeded {
                held: 3,
                requested: 2,
                limit: 4
            })
        ));
    }
}
