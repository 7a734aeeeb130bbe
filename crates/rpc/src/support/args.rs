#![forbid(unsafe_code)]

use super::ai::ai_error;
use sb_core::calendar::{DayBucket, TimeSlot, default_slot, slot_from_clock};
use sb_core::ids::ItemId;
use sb_core::model::{Assignee, EventType, LeadSource, PipelineStage, Priority};
use sb_core::reorder::Move;
use serde_json::Value;

pub(crate) type Args = serde_json::Map<String, Value>;

pub(crate) fn args_object(params: Option<Value>) -> Result<Args, Value> {
    match params {
        None | Some(Value::Null) => Ok(Args::new()),
        Some(Value::Object(obj)) => Ok(obj),
        Some(_) => Err(ai_error("INVALID_INPUT", "params must be an object")),
    }
}

pub(crate) fn require_string(args: &Args, key: &str) -> Result<String, Value> {
    let Some(v) = args.get(key).and_then(|v| v.as_str()) else {
        return Err(ai_error("INVALID_INPUT", &format!("{key} is required")));
    };
    Ok(v.to_string())
}

pub(crate) fn optional_string(args: &Args, key: &str) -> Result<Option<String>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::String(v) => Ok(Some(v.to_string())),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a string"),
        )),
    }
}

/// `None` when absent, `Some(None)` for an explicit null (clear the field).
pub(crate) fn optional_nullable_string(
    args: &Args,
    key: &str,
) -> Result<Option<Option<String>>, Value> {
    if !args.contains_key(key) {
        return Ok(None);
    }
    match args.get(key) {
        Some(Value::Null) => Ok(Some(None)),
        Some(Value::String(v)) => Ok(Some(Some(v.to_string()))),
        Some(_) => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a string or null"),
        )),
        None => Ok(None),
    }
}

pub(crate) fn optional_bool(args: &Args, key: &str) -> Result<Option<bool>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Bool(v) => Ok(Some(*v)),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a boolean"),
        )),
    }
}

pub(crate) fn optional_usize(args: &Args, key: &str) -> Result<Option<usize>, Value> {
    let Some(value) = args.get(key) else {
        return Ok(None);
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| {
                ai_error(
                    "INVALID_INPUT",
                    &format!("{key} must be a non-negative integer"),
                )
            }),
        _ => Err(ai_error(
            "INVALID_INPUT",
            &format!("{key} must be a non-negative integer"),
        )),
    }
}

pub(crate) fn require_usize(args: &Args, key: &str) -> Result<usize, Value> {
    optional_usize(args, key)?
        .ok_or_else(|| ai_error("INVALID_INPUT", &format!("{key} is required")))
}

pub(crate) fn require_item_id(args: &Args, key: &str) -> Result<ItemId, Value> {
    let raw = require_string(args, key)?;
    ItemId::try_new(raw)
        .map_err(|err| ai_error("INVALID_INPUT", &format!("{key}: {}", err.message())))
}

pub(crate) fn optional_item_id(args: &Args, key: &str) -> Result<Option<ItemId>, Value> {
    optional_string(args, key)?
        .map(|raw| {
            ItemId::try_new(raw)
                .map_err(|err| ai_error("INVALID_INPUT", &format!("{key}: {}", err.message())))
        })
        .transpose()
}

/// Parses an optional enum-valued field; `allowed` goes into the error message.
fn optional_choice<T>(
    args: &Args,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
    allowed: &str,
) -> Result<Option<T>, Value> {
    match optional_string(args, key)? {
        None => Ok(None),
        Some(raw) => parse(&raw).map(Some).ok_or_else(|| {
            ai_error(
                "INVALID_INPUT",
                &format!("{key} must be one of: {allowed}"),
            )
        }),
    }
}

fn stage_names() -> String {
    PipelineStage::ALL
        .iter()
        .map(|stage| stage.as_str())
        .collect::<Vec<_>>()
        .join("|")
}

pub(crate) fn optional_stage(args: &Args, key: &str) -> Result<Option<PipelineStage>, Value> {
    optional_choice(args, key, PipelineStage::parse, &stage_names())
}

pub(crate) fn optional_priority(args: &Args, key: &str) -> Result<Option<Priority>, Value> {
    optional_choice(args, key, Priority::parse, "high|medium|low")
}

pub(crate) fn optional_lead_source(args: &Args, key: &str) -> Result<Option<LeadSource>, Value> {
    optional_choice(
        args,
        key,
        LeadSource::parse,
        "cold_outreach|inbound|referral|linkedin|website|event|other",
    )
}

pub(crate) fn optional_event_type(args: &Args, key: &str) -> Result<Option<EventType>, Value> {
    optional_choice(args, key, EventType::parse, "task|demo|meeting|call|other")
}

pub(crate) fn optional_assignee(args: &Args, key: &str) -> Result<Option<Assignee>, Value> {
    optional_choice(args, key, Assignee::parse, "team|veeti|alppa|ilari")
}

pub(crate) fn optional_day(args: &Args, key: &str) -> Result<Option<DayBucket>, Value> {
    match optional_string(args, key)? {
        None => Ok(None),
        Some(raw) => DayBucket::parse(&raw).map(Some).map_err(|err| {
            ai_error("INVALID_INPUT", &format!("{key}: {}", err.message()))
        }),
    }
}

pub(crate) fn require_day(args: &Args, key: &str) -> Result<DayBucket, Value> {
    optional_day(args, key)?
        .ok_or_else(|| ai_error("INVALID_INPUT", &format!("{key} is required")))
}

/// A time slot on `date`, given either as `start`/`end` ("HH:MM") or as the clicked `hour`.
/// `None` when none of those fields are present.
pub(crate) fn optional_slot(args: &Args) -> Result<Option<TimeSlot>, Value> {
    let start = optional_string(args, "start")?;
    let end = optional_string(args, "end")?;
    let hour = optional_usize(args, "hour")?;
    if start.is_none() && end.is_none() && hour.is_none() {
        return Ok(None);
    }
    let day = require_day(args, "date")?;

    let slot = match (start, end, hour) {
        (Some(start), Some(end), _) => slot_from_clock(day, &start, &end),
        (None, None, Some(hour)) => {
            let hour = u8::try_from(hour).unwrap_or(u8::MAX);
            default_slot(day, hour)
        }
        _ => {
            return Err(ai_error(
                "INVALID_INPUT",
                "provide both start and end, or hour",
            ));
        }
    };
    slot.map(Some)
        .map_err(|err| ai_error("INVALID_INPUT", err.message()))
}

pub(crate) fn require_slot(args: &Args) -> Result<TimeSlot, Value> {
    optional_slot(args)?.ok_or_else(|| {
        ai_error(
            "INVALID_INPUT",
            "date with start/end or hour is required",
        )
    })
}

/// Reads a drag result: `id`, `source_index`, `dest_index`, and the two bucket keys through
/// `bucket`. A missing or null destination is a drop outside any column.
pub(crate) fn require_move<B>(
    args: &Args,
    source_key: &str,
    dest_key: &str,
    bucket: impl Fn(&Args, &str) -> Result<Option<B>, Value>,
) -> Result<Move<B>, Value> {
    let item_id = require_item_id(args, "id")?;
    let source_bucket = bucket(args, source_key)?
        .ok_or_else(|| ai_error("INVALID_INPUT", &format!("{source_key} is required")))?;
    Ok(Move {
        item_id,
        source_bucket,
        source_index: require_usize(args, "source_index")?,
        dest_bucket: bucket(args, dest_key)?,
        dest_index: optional_usize(args, "dest_index")?.unwrap_or(0),
    })
}
