//! Wire schemas and field codecs of every persisted entity.
//!
//! ```text
//! ┌──────────────────────────┬──────────────┬──────────────────────────────┐
//! │ Entity                   │ Accepted len │ Tombstones                   │
//! ├──────────────────────────┼──────────────┼──────────────────────────────┤
//! │ item                     │ ≥ 16         │ 10 discount · 16 promo_code  │
//! │ problem                  │ 3..=4        │ 3 severity                   │
//! │ info                     │ 2..=4        │                              │
//! │ additions                │ 1..=4        │                              │
//! │ product                  │ ≥ 7          │ 7 image_url                  │
//! │ configuration            │ 2..=3        │                              │
//! │ subcontract              │ 3..=4        │                              │
//! │ schedule                 │ 1..=2        │                              │
//! │ service                  │ exactly 2    │                              │
//! │ rules                    │ 1..=3        │                              │
//! │ items                    │ exactly 1    │                              │
//! └──────────────────────────┴──────────────┴──────────────────────────────┘
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use minicbor::data::Type;
use minicbor::Decoder;

use super::schema::{FieldDef, LengthRule, Schema, WireType};
use super::{
    read_list, read_optional, read_record, write_list, write_optional, write_record, DecodeError,
    Enc, EncodeError, Record,
};
use crate::additions::{
    Additions, ConfigurationAdditions, ProductAdditions, Rules, ServiceAdditions, ServiceSchedule,
    SubRecord, SubcontractAdditions,
};
use crate::collection::Items;
use crate::diag::{Info, InfoId, Problem, ProblemCode};
use crate::item::Item;
use crate::money::Money;
use crate::spec::ItemType;
use crate::types::{ItemId, PriceColumn, SpaceId, TaxRate, UniqId};

fn unknown_position(entity: &'static str, position: usize) -> EncodeError {
    EncodeError::UnknownPosition { entity, position }
}

fn no_decoder(position: usize) -> DecodeError {
    DecodeError::invalid(format!("no decoder for position {position}"))
}

fn read_string(dec: &mut Decoder<'_>) -> Result<String, DecodeError> {
    Ok(dec.str()?.to_string())
}

fn parse_uniq_id(raw: &str) -> Result<UniqId, DecodeError> {
    raw.parse()
        .map_err(|err| DecodeError::invalid(format!("uniq id {raw:?}: {err}")))
}

// =============================================================================
// Item
// =============================================================================

impl Record for Item {
    const SCHEMA: Schema = Schema {
        entity: "item",
        fields: &[
            FieldDef::active("uniq_id", WireType::Str),
            FieldDef::active("item_id", WireType::Str),
            FieldDef::active("type", WireType::U32),
            FieldDef::active("parent_uniq_id", WireType::Str),
            FieldDef::active("parent_item_id", WireType::Str),
            FieldDef::active("name", WireType::Str),
            FieldDef::active("count", WireType::U32),
            FieldDef::active("price", WireType::I64),
            FieldDef::active("bonus", WireType::I64),
            FieldDef::tombstone("discount", WireType::I64),
            FieldDef::active("count_multiplicity", WireType::U32),
            FieldDef::active("problems", WireType::Array),
            FieldDef::active("infos", WireType::Map),
            FieldDef::active("additions", WireType::Record),
            FieldDef::active("rules", WireType::Record),
            FieldDef::tombstone("promo_code", WireType::Str),
            FieldDef::active("space_id", WireType::Str),
            FieldDef::active("price_column", WireType::U32),
            FieldDef::active("commit_fingerprint", WireType::Str),
            FieldDef::active("is_selected", WireType::Bool),
        ],
        accepted: LengthRule::AtLeast(16),
    };

    fn blank() -> Self {
        Item::blank()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => {
                enc.str(&self.uniq_id.to_string())?;
            }
            2 => {
                enc.str(self.item_id.as_str())?;
            }
            3 => {
                enc.u32(self.item_type.code())?;
            }
            4 => {
                let parent = self
                    .parent_uniq_id
                    .map(|id| id.to_string())
                    .unwrap_or_default();
                enc.str(&parent)?;
            }
            5 => {
                enc.str(self.parent_item_id.as_ref().map_or("", ItemId::as_str))?;
            }
            6 => {
                enc.str(&self.name)?;
            }
            7 => {
                enc.u32(self.count)?;
            }
            8 => {
                enc.i64(self.price.minor())?;
            }
            9 => {
                enc.i64(self.bonus.minor())?;
            }
            11 => {
                enc.u32(self.count_multiplicity)?;
            }
            12 => write_list(self.diagnostics.transient_problems().iter(), enc)?,
            13 => {
                let infos = self.diagnostics.infos();
                enc.map(infos.len() as u64)?;
                for (id, info) in infos {
                    enc.u32(id.code())?;
                    write_record(info, enc)?;
                }
            }
            14 => write_record(&self.additions, enc)?,
            15 => self.rules.read(|rules| write_record(rules, enc))?,
            17 => {
                enc.str(self.space_id.as_str())?;
            }
            18 => {
                enc.u32(self.price_column.get())?;
            }
            19 => {
                enc.str(&self.commit_fingerprint)?;
            }
            20 => {
                enc.bool(self.is_selected)?;
            }
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        }
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.uniq_id = parse_uniq_id(dec.str()?)?,
            2 => self.item_id = ItemId::new(dec.str()?),
            3 => self.item_type = ItemType::from_code(dec.u32()?)?,
            4 => {
                let raw = dec.str()?;
                self.parent_uniq_id = if raw.is_empty() {
                    None
                } else {
                    Some(parse_uniq_id(raw)?)
                };
            }
            5 => {
                let raw = dec.str()?;
                self.parent_item_id = (!raw.is_empty()).then(|| ItemId::new(raw));
            }
            6 => self.name = read_string(dec)?,
            7 => self.count = dec.u32()?,
            8 => self.price = Money::from_minor(dec.i64()?),
            9 => self.bonus = Money::from_minor(dec.i64()?),
            11 => self.count_multiplicity = dec.u32()?,
            12 => {
                let problems = read_list::<Problem>(dec, "problems")?;
                self.diagnostics.replace_problems(problems);
            }
            13 => self.diagnostics.replace_infos(read_info_map(dec)?),
            14 => {
                if dec.datatype()? == Type::Null {
                    dec.null()?;
                    self.additions = Additions::default();
                } else {
                    self.additions = read_record(dec)?;
                }
            }
            15 => self.rules = SubRecord::new(read_record(dec)?),
            17 => self.space_id = SpaceId::new(dec.str()?),
            18 => self.price_column = PriceColumn::new(dec.u32()?),
            19 => self.commit_fingerprint = read_string(dec)?,
            20 => self.is_selected = dec.bool()?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

/// Infos are keyed by their numeric id; the key must agree with the id the
/// record carries.
fn read_info_map(dec: &mut Decoder<'_>) -> Result<BTreeMap<InfoId, Info>, DecodeError> {
    let len = dec
        .map()?
        .ok_or(DecodeError::IndefiniteLength { entity: "infos" })?;
    let mut infos = BTreeMap::new();
    for index in 0..len {
        let entry = index as usize + 1;
        let key = dec.u32().map_err(|err| DecodeError::from(err).at("info key", entry))?;
        let info: Info = read_record(dec).map_err(|err| err.at(format!("info[{key}]"), entry))?;
        if info.id.code() != key {
            return Err(DecodeError::invalid(format!(
                "info keyed {key} carries id {}",
                info.id.code()
            ))
            .at(format!("info[{key}]"), entry));
        }
        if infos.insert(info.id, info).is_some() {
            return Err(DecodeError::invalid(format!("duplicate info key {key}"))
                .at(format!("info[{key}]"), entry));
        }
    }
    Ok(infos)
}

// =============================================================================
// Diagnostics
// =============================================================================

impl Record for Problem {
    const SCHEMA: Schema = Schema {
        entity: "problem",
        fields: &[
            FieldDef::active("code", WireType::U32),
            FieldDef::active("message", WireType::Str),
            FieldDef::tombstone("severity", WireType::U32),
            FieldDef::active("hidden", WireType::Bool),
        ],
        accepted: LengthRule::Between(3, 4),
    };

    fn blank() -> Self {
        Problem::new(ProblemCode::Other(0), "")
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => enc.u32(self.code.code())?,
            2 => enc.str(&self.message)?,
            4 => enc.bool(self.hidden)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        };
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.code = ProblemCode::from_code(dec.u32()?),
            2 => self.message = read_string(dec)?,
            4 => self.hidden = dec.bool()?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

impl Record for Info {
    const SCHEMA: Schema = Schema {
        entity: "info",
        fields: &[
            FieldDef::active("id", WireType::U32),
            FieldDef::active("message", WireType::Str),
            FieldDef::active("old_value", WireType::I64),
            FieldDef::active("new_value", WireType::I64),
        ],
        accepted: LengthRule::Between(2, 4),
    };

    fn blank() -> Self {
        Info::new(InfoId::Other(0), "")
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => enc.u32(self.id.code())?,
            2 => enc.str(&self.message)?,
            3 => enc.i64(self.old_value)?,
            4 => enc.i64(self.new_value)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        };
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.id = InfoId::from_code(dec.u32()?),
            2 => self.message = read_string(dec)?,
            3 => self.old_value = dec.i64()?,
            4 => self.new_value = dec.i64()?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

// =============================================================================
// Additions
// =============================================================================

fn write_slot<R: Record>(
    slot: &Option<SubRecord<R>>,
    enc: &mut Enc<'_>,
) -> Result<(), EncodeError> {
    match slot {
        Some(record) => record.read(|value| write_optional(Some(value), enc)),
        None => write_optional::<R>(None, enc),
    }
}

fn read_slot<R: Record>(dec: &mut Decoder<'_>) -> Result<Option<SubRecord<R>>, DecodeError> {
    Ok(read_optional(dec)?.map(SubRecord::new))
}

impl Record for Additions {
    const SCHEMA: Schema = Schema {
        entity: "additions",
        fields: &[
            FieldDef::active("product", WireType::Record),
            FieldDef::active("configuration", WireType::Record),
            FieldDef::active("subcontract", WireType::Record),
            FieldDef::active("service", WireType::Record),
        ],
        accepted: LengthRule::Between(1, 4),
    };

    fn blank() -> Self {
        Additions::default()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => write_slot(&self.product, enc),
            2 => write_slot(&self.configuration, enc),
            3 => write_slot(&self.subcontract, enc),
            4 => write_slot(&self.service, enc),
            _ => Err(unknown_position(Self::SCHEMA.entity, position)),
        }
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.product = read_slot(dec)?,
            2 => self.configuration = read_slot(dec)?,
            3 => self.subcontract = read_slot(dec)?,
            4 => self.service = read_slot(dec)?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

impl Record for ProductAdditions {
    const SCHEMA: Schema = Schema {
        entity: "product",
        fields: &[
            FieldDef::active("availability_checked", WireType::Bool),
            FieldDef::active("available", WireType::Bool),
            FieldDef::active("stock", WireType::U32),
            FieldDef::active("tax_rate_bps", WireType::U32),
            FieldDef::active("category", WireType::Str),
            FieldDef::active("brand", WireType::Str),
            FieldDef::tombstone("image_url", WireType::Str),
            FieldDef::active("image", WireType::Str),
            FieldDef::active("credit_eligible", WireType::Bool),
        ],
        accepted: LengthRule::AtLeast(7),
    };

    fn blank() -> Self {
        ProductAdditions::default()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => enc.bool(self.availability_checked)?,
            2 => enc.bool(self.available)?,
            3 => enc.u32(self.stock)?,
            4 => enc.u32(self.tax_rate.bps())?,
            5 => enc.str(&self.category)?,
            6 => enc.str(&self.brand)?,
            8 => enc.str(&self.image)?,
            9 => enc.bool(self.credit_eligible)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        };
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.availability_checked = dec.bool()?,
            2 => self.available = dec.bool()?,
            3 => self.stock = dec.u32()?,
            4 => self.tax_rate = TaxRate::from_bps(dec.u32()?),
            5 => self.category = read_string(dec)?,
            6 => self.brand = read_string(dec)?,
            8 => self.image = read_string(dec)?,
            9 => self.credit_eligible = dec.bool()?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

impl Record for ConfigurationAdditions {
    const SCHEMA: Schema = Schema {
        entity: "configuration",
        fields: &[
            FieldDef::active("configuration_id", WireType::Str),
            FieldDef::active("title", WireType::Str),
            FieldDef::active("assembled", WireType::Bool),
        ],
        accepted: LengthRule::Between(2, 3),
    };

    fn blank() -> Self {
        ConfigurationAdditions::default()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => enc.str(&self.configuration_id)?,
            2 => enc.str(&self.title)?,
            3 => enc.bool(self.assembled)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        };
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.configuration_id = read_string(dec)?,
            2 => self.title = read_string(dec)?,
            3 => self.assembled = dec.bool()?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

impl Record for SubcontractAdditions {
    const SCHEMA: Schema = Schema {
        entity: "subcontract",
        fields: &[
            FieldDef::active("city_id", WireType::Str),
            FieldDef::active("address", WireType::Str),
            FieldDef::active("available_in_city", WireType::Bool),
            FieldDef::active("schedule", WireType::Record),
        ],
        accepted: LengthRule::Between(3, 4),
    };

    fn blank() -> Self {
        SubcontractAdditions::default()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => {
                enc.str(&self.city_id)?;
            }
            2 => {
                enc.str(&self.address)?;
            }
            3 => {
                enc.bool(self.available_in_city)?;
            }
            4 => write_optional(self.schedule.as_ref(), enc)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        }
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.city_id = read_string(dec)?,
            2 => self.address = read_string(dec)?,
            3 => self.available_in_city = dec.bool()?,
            4 => self.schedule = read_optional(dec)?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

// =============================================================================
// Service Schedule Timestamps
// =============================================================================

/// Layout older clients wrote: `2021-06-01 14:30:00.5 +0300 MSK`.
const LEGACY_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Parses an RFC 3339 timestamp, falling back to the legacy layout. One
/// trailing zone abbreviation after the numeric offset is ignored.
pub(crate) fn parse_schedule_date(raw: &str) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if !(3..=4).contains(&tokens.len()) {
        return Err(DecodeError::invalid(format!("timestamp {raw:?}: unknown layout")));
    }
    DateTime::parse_from_str(&tokens[..3].join(" "), LEGACY_TIMESTAMP)
        .map(|parsed| Some(parsed.with_timezone(&Utc)))
        .map_err(|err| DecodeError::invalid(format!("timestamp {raw:?}: {err}")))
}

fn format_schedule_date(date: Option<&DateTime<Utc>>) -> String {
    date.map(|d| d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}

impl Record for ServiceSchedule {
    const SCHEMA: Schema = Schema {
        entity: "schedule",
        fields: &[
            FieldDef::active("date", WireType::Str),
            FieldDef::active("slot", WireType::Str),
        ],
        accepted: LengthRule::Between(1, 2),
    };

    fn blank() -> Self {
        ServiceSchedule::default()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => enc.str(&format_schedule_date(self.date.as_ref()))?,
            2 => enc.str(&self.slot)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        };
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.date = parse_schedule_date(dec.str()?)?,
            2 => self.slot = read_string(dec)?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

impl Record for ServiceAdditions {
    const SCHEMA: Schema = Schema {
        entity: "service",
        fields: &[
            FieldDef::active("group_code", WireType::Str),
            FieldDef::active("duration_months", WireType::U32),
        ],
        accepted: LengthRule::Exact(2),
    };

    fn blank() -> Self {
        ServiceAdditions::default()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => enc.str(&self.group_code)?,
            2 => enc.u32(self.duration_months)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        };
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.group_code = read_string(dec)?,
            2 => self.duration_months = dec.u32()?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

impl Record for Rules {
    const SCHEMA: Schema = Schema {
        entity: "rules",
        fields: &[
            FieldDef::active("max_count", WireType::U32),
            FieldDef::active("resale_allowed", WireType::Bool),
            FieldDef::active("commodity_group", WireType::Str),
        ],
        accepted: LengthRule::Between(1, 3),
    };

    fn blank() -> Self {
        Rules::default()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => enc.u32(self.max_count)?,
            2 => enc.bool(self.resale_allowed)?,
            3 => enc.str(&self.commodity_group)?,
            _ => return Err(unknown_position(Self::SCHEMA.entity, position)),
        };
        Ok(())
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        match position {
            1 => self.max_count = dec.u32()?,
            2 => self.resale_allowed = dec.bool()?,
            3 => self.commodity_group = read_string(dec)?,
            _ => return Err(no_decoder(position)),
        }
        Ok(())
    }
}

// =============================================================================
// Basket Snapshot
// =============================================================================

impl Record for Items {
    const SCHEMA: Schema = Schema {
        entity: "items",
        fields: &[FieldDef::active("items", WireType::Array)],
        accepted: LengthRule::Exact(1),
    };

    fn blank() -> Self {
        Items::new()
    }

    fn encode_field(&self, position: usize, enc: &mut Enc<'_>) -> Result<(), EncodeError> {
        match position {
            1 => write_list(self.ordered().into_iter(), enc),
            _ => Err(unknown_position(Self::SCHEMA.entity, position)),
        }
    }

    fn decode_field(&mut self, position: usize, dec: &mut Decoder<'_>) -> Result<(), DecodeError> {
        if position != 1 {
            return Err(no_decoder(position));
        }
        for (index, item) in read_list::<Item>(dec, "items")?.into_iter().enumerate() {
            let uniq_id = item.uniq_id();
            if self.insert(item).is_some() {
                return Err(DecodeError::invalid(format!("duplicate uniq id {uniq_id}"))
                    .at(Item::SCHEMA.entity, index + 1));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, decode_into, encode, write_placeholder};
    use crate::codec::schema::FieldState;
    use chrono::TimeZone;
    use minicbor::Encoder;

    fn raw(build: impl FnOnce(&mut Enc<'_>)) -> Vec<u8> {
        let mut buf = Vec::new();
        let mut enc = Encoder::new(&mut buf);
        build(&mut enc);
        buf
    }

    /// Encodes only the first `len` positions, as an older writer would.
    fn encode_prefix<R: Record>(record: &R, len: usize) -> Vec<u8> {
        raw(|enc| {
            enc.array(len as u64).unwrap();
            for (index, field) in R::SCHEMA.fields.iter().take(len).enumerate() {
                match field.state {
                    FieldState::Active => record.encode_field(index + 1, enc).unwrap(),
                    FieldState::Tombstone => write_placeholder(enc, field.wire).unwrap(),
                }
            }
        })
    }

    fn full_item() -> Item {
        let mut item = Item::product("30012345", 3, Money::from_minor(2_499_900))
            .with_name("Laptop 15\"")
            .with_bonus(Money::from_minor(1500))
            .with_pricing_location(SpaceId::new("msk-01"), PriceColumn::new(4));
        item.add_problem(Problem::not_available());
        item.add_info(Info::price_changed(
            Money::from_minor(2_599_900),
            Money::from_minor(2_499_900),
        ));
        item.rules.set(Rules {
            max_count: 5,
            resale_allowed: false,
            commodity_group: "electronics".into(),
        });
        if let Some(product) = &item.additions.product {
            product.set(ProductAdditions {
                availability_checked: true,
                available: true,
                stock: 12,
                tax_rate: TaxRate::from_bps(2000),
                category: "laptops".into(),
                brand: "Acme".into(),
                image: "laptop.png".into(),
                credit_eligible: true,
            });
        }
        item.commit_changes();
        item
    }

    #[test]
    fn test_item_round_trip() {
        let item = full_item();
        let decoded: Item = decode(&encode(&item).unwrap()).unwrap();

        assert_eq!(decoded, item);
        assert_eq!(decoded.problems().len(), 1);
        assert!(decoded.info(InfoId::PriceChanged).is_some());
        assert!(!decoded.is_changed());
    }

    #[test]
    fn test_child_links_round_trip() {
        let parent = Item::product("30012345", 1, Money::from_minor(1000));
        let mut child = Item::service("SRV-1", 1, Money::from_minor(100));
        parent.add_child(&mut child).unwrap();

        let decoded: Item = decode(&encode(&child).unwrap()).unwrap();
        assert_eq!(decoded.parent_uniq_id(), Some(parent.uniq_id()));
        assert_eq!(decoded.parent_item_id().map(ItemId::as_str), Some("30012345"));
        assert_eq!(decoded.item_type(), ItemType::Service);
    }

    #[test]
    fn test_oldest_item_payload_keeps_defaults() {
        let item = full_item();
        let bytes = encode_prefix(&item, 16);
        let decoded: Item = decode(&bytes).unwrap();

        assert_eq!(decoded.uniq_id(), item.uniq_id());
        assert_eq!(decoded.count(), 3);
        assert_eq!(decoded.space_id(), &SpaceId::default());
        assert_eq!(decoded.price_column(), PriceColumn::default());
        assert_eq!(decoded.commit_fingerprint(), "");
        assert!(decoded.is_selected());
    }

    #[test]
    fn test_item_below_oldest_length_is_rejected() {
        let item = full_item();
        let bytes = encode_prefix(&item, 15);
        let mut target = Item::blank();

        let err = decode_into(&bytes, &mut target).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Length {
                entity: "item",
                found: 15,
                ..
            }
        ));
        assert!(target.uniq_id().is_nil());
    }

    #[test]
    fn test_item_decode_is_not_transactional() {
        let item = full_item();
        let bytes = raw(|enc| {
            enc.array(20).unwrap();
            item.encode_field(1, enc).unwrap();
            item.encode_field(2, enc).unwrap();
            enc.u32(99).unwrap();
        });
        let mut target = Item::blank();

        let err = decode_into(&bytes, &mut target).unwrap_err();
        assert_eq!(err.path(), vec![("type", 3)]);
        assert!(matches!(err.root_cause(), DecodeError::InvalidType(_)));
        assert_eq!(target.uniq_id(), item.uniq_id());
        assert_eq!(target.item_id().as_str(), "30012345");
        assert_eq!(target.name(), "");
    }

    #[test]
    fn test_item_tombstones_are_zero_values() {
        let item = full_item();
        let bytes = encode(&item).unwrap();
        let mut dec = Decoder::new(&bytes);

        assert_eq!(dec.array().unwrap(), Some(20));
        for _ in 1..10 {
            dec.skip().unwrap();
        }
        assert_eq!(dec.i64().unwrap(), 0);
        for _ in 11..16 {
            dec.skip().unwrap();
        }
        assert_eq!(dec.str().unwrap(), "");
    }

    #[test]
    fn test_problem_layout() {
        let problem = Problem {
            code: ProblemCode::CountReduced,
            message: "reduced".into(),
            hidden: true,
        };
        let expected = raw(|enc| {
            enc.array(4)
                .unwrap()
                .u32(2)
                .unwrap()
                .str("reduced")
                .unwrap()
                .u32(0)
                .unwrap()
                .bool(true)
                .unwrap();
        });
        assert_eq!(encode(&problem).unwrap(), expected);

        let old = encode_prefix(&problem, 3);
        let decoded: Problem = decode(&old).unwrap();
        assert_eq!(decoded.code, ProblemCode::CountReduced);
        assert!(!decoded.hidden);
    }

    #[test]
    fn test_info_key_must_match_id() {
        let info = Info::count_changed(4, 2);
        let bytes = raw(|enc| {
            enc.map(1).unwrap().u32(1).unwrap();
            write_record(&info, enc).unwrap();
        });
        let mut dec = Decoder::new(&bytes);
        let err = read_info_map(&mut dec).unwrap_err();
        assert_eq!(err.path(), vec![("info[1]", 1)]);
    }

    #[test]
    fn test_info_keys_must_be_unique() {
        let info = Info::count_changed(4, 2);
        let bytes = raw(|enc| {
            enc.map(2).unwrap().u32(2).unwrap();
            write_record(&info, enc).unwrap();
            enc.u32(2).unwrap();
            write_record(&info, enc).unwrap();
        });
        let mut dec = Decoder::new(&bytes);
        let err = read_info_map(&mut dec).unwrap_err();
        assert_eq!(err.path(), vec![("info[2]", 2)]);
    }

    #[test]
    fn test_other_codes_round_trip_as_named_codes() {
        let mut item = full_item();
        item.add_problem(Problem::new(ProblemCode::Other(1), "raw code"));
        item.add_problem(Problem::new(ProblemCode::Other(404), "newer writer"));
        item.add_info(Info::new(InfoId::Other(2), "raw count info"));
        item.add_info(Info::new(InfoId::Other(77), "newer info"));

        let decoded: Item = decode(&encode(&item).unwrap()).unwrap();
        assert_eq!(decoded, item);
        assert_eq!(decoded.diagnostics().infos().len(), 3);
        assert!(decoded.has_problem(ProblemCode::Other(404)));
    }

    #[test]
    fn test_additions_accept_shorter_payloads() {
        let product = ProductAdditions {
            stock: 3,
            ..ProductAdditions::default()
        };
        let bytes = raw(|enc| {
            enc.array(1).unwrap();
            write_record(&product, enc).unwrap();
        });
        let additions: Additions = decode(&bytes).unwrap();
        assert_eq!(additions.product.as_ref().map(|p| p.get().stock), Some(3));
        assert!(additions.configuration.is_none());
        assert!(additions.subcontract.is_none());
        assert!(additions.service.is_none());

        let three = raw(|enc| {
            enc.array(3).unwrap().null().unwrap().null().unwrap();
            write_record(&SubcontractAdditions::default(), enc).unwrap();
        });
        let additions: Additions = decode(&three).unwrap();
        assert!(additions.subcontract.is_some());
        assert!(additions.product.is_none());
    }

    #[test]
    fn test_additions_round_trip_all_slots() {
        let additions = Additions {
            product: Some(SubRecord::new(ProductAdditions::default())),
            configuration: Some(SubRecord::new(ConfigurationAdditions {
                configuration_id: "CFG-7".into(),
                title: "Gaming PC".into(),
                assembled: true,
            })),
            subcontract: Some(SubRecord::new(SubcontractAdditions {
                city_id: "msk".into(),
                address: "Tverskaya 1".into(),
                available_in_city: true,
                schedule: Some(ServiceSchedule {
                    date: Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap()),
                    slot: "10-12".into(),
                }),
            })),
            service: Some(SubRecord::new(ServiceAdditions {
                group_code: "WRN".into(),
                duration_months: 24,
            })),
        };
        let decoded: Additions = decode(&encode(&additions).unwrap()).unwrap();
        assert_eq!(decoded, additions);
    }

    #[test]
    fn test_nested_error_path() {
        let bytes = raw(|enc| {
            enc.array(3).unwrap().null().unwrap().null().unwrap();
            enc.array(4)
                .unwrap()
                .str("msk")
                .unwrap()
                .str("")
                .unwrap()
                .bool(true)
                .unwrap();
            enc.array(2).unwrap().str("next tuesday").unwrap().str("").unwrap();
        });
        let err = decode::<Additions>(&bytes).unwrap_err();

        assert_eq!(
            err.path(),
            vec![("subcontract", 3), ("schedule", 4), ("date", 1)]
        );
        assert!(matches!(err.root_cause(), DecodeError::InvalidValue { .. }));
    }

    #[test]
    fn test_service_additions_need_exact_length() {
        let bytes = raw(|enc| {
            enc.array(1).unwrap().str("WRN").unwrap();
        });
        assert!(matches!(
            decode::<ServiceAdditions>(&bytes),
            Err(DecodeError::Length { entity: "service", .. })
        ));
    }

    #[test]
    fn test_product_additions_oldest_length() {
        let bytes = raw(|enc| {
            enc.array(7)
                .unwrap()
                .bool(true)
                .unwrap()
                .bool(true)
                .unwrap()
                .u32(4)
                .unwrap()
                .u32(1000)
                .unwrap()
                .str("kettles")
                .unwrap()
                .str("Acme")
                .unwrap()
                .str("http://img/old.png")
                .unwrap();
        });
        let product: ProductAdditions = decode(&bytes).unwrap();
        assert_eq!(product.stock, 4);
        assert_eq!(product.tax_rate, TaxRate::from_bps(1000));
        assert_eq!(product.image, "");
        assert!(!product.credit_eligible);
    }

    #[test]
    fn test_rules_default_on_short_payload() {
        let bytes = raw(|enc| {
            enc.array(1).unwrap().u32(7).unwrap();
        });
        let rules: Rules = decode(&bytes).unwrap();
        assert_eq!(rules.max_count, 7);
        assert!(rules.resale_allowed);
    }

    #[test]
    fn test_schedule_timestamps() {
        let strict = parse_schedule_date("2021-06-01T11:30:00Z").unwrap();
        let legacy = parse_schedule_date("2021-06-01 14:30:00 +0300 MSK").unwrap();
        let expected = Utc.with_ymd_and_hms(2021, 6, 1, 11, 30, 0).unwrap();

        assert_eq!(strict, Some(expected));
        assert_eq!(legacy, Some(expected));
        assert_eq!(parse_schedule_date("").unwrap(), None);
        assert!(parse_schedule_date("tomorrow").is_err());
        assert!(parse_schedule_date("2021-06-01 14:30:00 +0300 MSK trailing garbage").is_err());

        let fractional = parse_schedule_date("2021-06-01 14:30:00.5 +0000").unwrap();
        assert_eq!(fractional.map(|d| d.timestamp_subsec_millis()), Some(500));
        assert_eq!(format_schedule_date(Some(&expected)), "2021-06-01T11:30:00Z");
    }

    #[test]
    fn test_items_snapshot_round_trip() {
        let product = Item::product("30012345", 1, Money::from_minor(1000)).with_name("Kettle");
        let mut service = Item::service("SRV-1", 1, Money::from_minor(100)).with_name("Warranty");
        product.add_child(&mut service).unwrap();
        let items: Items = vec![product, service].into_iter().collect();

        let decoded: Items = decode(&encode(&items).unwrap()).unwrap();
        assert_eq!(decoded, items);
        assert_eq!(decoded.roots().len(), 1);
    }

    #[test]
    fn test_items_rejects_duplicate_uniq_ids() {
        let item = Item::product("30012345", 1, Money::from_minor(1000));
        let bytes = raw(|enc| {
            enc.array(1).unwrap().array(2).unwrap();
            write_record(&item, enc).unwrap();
            write_record(&item, enc).unwrap();
        });
        let err = decode::<Items>(&bytes).unwrap_err();
        assert_eq!(err.path(), vec![("items", 1), ("item", 2)]);
    }
}
