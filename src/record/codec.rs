//! Fixed-width encodings for schemas and records living on page 0 / data
//! pages.

use crate::error::{Result, StorageError};
use crate::schema::Schema;
use crate::types::{DataType, Value};

const TOMBSTONE_LIVE: u8 = b'+';
const TOMBSTONE_DEAD: u8 = b'-';

fn data_type_tag(dt: DataType) -> u8 {
    match dt {
        DataType::Int => 0,
        DataType::Float => 1,
        DataType::Bool => 2,
        DataType::String => 3,
    }
}

fn data_type_from_tag(tag: u8) -> Result<DataType> {
    Ok(match tag {
        0 => DataType::Int,
        1 => DataType::Float,
        2 => DataType::Bool,
        3 => DataType::String,
        other => return Err(StorageError::corruption(format!("bad data type tag {other}"))),
    })
}

/// Encode a schema's attribute list. Does not include the page-0 tuple
/// count / free-page-hint prefix; callers assemble the full page.
pub fn encode_schema(schema: &Schema) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(schema.num_attrs() as u32).to_le_bytes());
    for (name, (dt, ty_len)) in schema
        .attr_names()
        .iter()
        .zip(schema.data_types().iter().zip(schema_type_lengths(schema)))
    {
        let name_bytes = name.as_bytes();
        buf.extend_from_slice(&(name_bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(name_bytes);
        buf.push(data_type_tag(*dt));
        buf.extend_from_slice(&(ty_len as u32).to_le_bytes());
    }
    buf.extend_from_slice(&(schema.key_attrs().len() as u32).to_le_bytes());
    for &k in schema.key_attrs() {
        buf.extend_from_slice(&(k as u32).to_le_bytes());
    }
    buf
}

fn schema_type_lengths(schema: &Schema) -> Vec<usize> {
    (0..schema.num_attrs())
        .map(|i| schema.attr_width(i).unwrap_or(0))
        .collect()
}

/// Decode a schema previously written by [`encode_schema`], returning the
/// schema and the number of bytes consumed.
pub fn decode_schema(buf: &[u8]) -> Result<(Schema, usize)> {
    let mut pos = 0usize;
    let read_u32 = |buf: &[u8], pos: &mut usize| -> Result<u32> {
        let bytes: [u8; 4] = buf
            .get(*pos..*pos + 4)
            .ok_or_else(|| StorageError::corruption("truncated schema"))?
            .try_into()
            .unwrap();
        *pos += 4;
        Ok(u32::from_le_bytes(bytes))
    };

    let num_attrs = read_u32(buf, &mut pos)? as usize;
    let mut names = Vec::with_capacity(num_attrs);
    let mut types = Vec::with_capacity(num_attrs);
    let mut lengths = Vec::with_capacity(num_attrs);
    for _ in 0..num_attrs {
        let name_len = read_u32(buf, &mut pos)? as usize;
        let name = String::from_utf8(
            buf.get(pos..pos + name_len)
                .ok_or_else(|| StorageError::corruption("truncated attribute name"))?
                .to_vec(),
        )
        .map_err(|_| StorageError::corruption("non-utf8 attribute name"))?;
        pos += name_len;
        let tag = *buf
            .get(pos)
            .ok_or_else(|| StorageError::corruption("truncated data type tag"))?;
        pos += 1;
        let data_type = data_type_from_tag(tag)?;
        let type_length = read_u32(buf, &mut pos)? as usize;
        names.push(name);
        types.push(data_type);
        lengths.push(type_length);
    }
    let num_keys = read_u32(buf, &mut pos)? as usize;
    let mut key_attrs = Vec::with_capacity(num_keys);
    for _ in 0..num_keys {
        key_attrs.push(read_u32(buf, &mut pos)? as usize);
    }

    let schema = Schema::new(names, types, lengths, key_attrs)?;
    Ok((schema, pos))
}

/// Encode a record's tombstone byte and attribute values. `values` must
/// match `schema` in count and type.
pub fn encode_record(values: &[Value], schema: &Schema) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; schema.record_size()];
    buf[0] = TOMBSTONE_LIVE;
    for i in 0..schema.num_attrs() {
        let offset = 1 + schema.attr_offset(i)?;
        let width = schema.attr_width(i)?;
        values[i].encode(&mut buf[offset..offset + width], width);
    }
    Ok(buf)
}

/// True if the tombstone byte at the start of `record_bytes` marks a live
/// record.
pub fn is_live(record_bytes: &[u8]) -> bool {
    record_bytes.first() == Some(&TOMBSTONE_LIVE)
}

/// Mark a record slot as deleted in place.
pub fn mark_tombstone(record_bytes: &mut [u8]) {
    record_bytes[0] = TOMBSTONE_DEAD;
}

/// Decode a live record's attribute values.
pub fn decode_record(record_bytes: &[u8], schema: &Schema) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(schema.num_attrs());
    for i in 0..schema.num_attrs() {
        let offset = 1 + schema.attr_offset(i)?;
        let width = schema.attr_width(i)?;
        values.push(Value::decode(schema.data_types()[i], &record_bytes[offset..offset + width], width));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn sample_schema() -> Schema {
        Schema::new(
            vec!["id".into(), "name".into()],
            vec![DataType::Int, DataType::String],
            vec![0, 8],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn schema_round_trips() {
        let schema = sample_schema();
        let encoded = encode_schema(&schema);
        let (decoded, consumed) = decode_schema(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded, schema);
    }

    #[test]
    fn record_round_trips_and_tombstones() {
        let schema = sample_schema();
        let values = vec![Value::Int(42), Value::String("hi".into())];
        let mut bytes = encode_record(&values, &schema).unwrap();
        assert!(is_live(&bytes));
        assert_eq!(decode_record(&bytes, &schema).unwrap(), values);

        mark_tombstone(&mut bytes);
        assert!(!is_live(&bytes));
    }
}
