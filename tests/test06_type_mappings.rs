#![cfg(feature = "sqlite")]

mod common;

use std::any::Any;

use sql_mapper::prelude::*;

/// Stored as text like `"21.5C"`, known to the mapper only through its type mappings.
#[derive(Debug, Default, Clone, PartialEq)]
struct Celsius(f64);

impl FromSql for Celsius {
    fn sql_type() -> SqlType {
        SqlType::Custom("Celsius")
    }

    fn from_value(_value: RowValues) -> Option<Self> {
        None
    }
}

impl ToParam for Celsius {
    fn to_param(&self) -> ParamValue {
        ParamValue::Value(RowValues::Float(self.0))
    }

    fn mapped(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Sample {
    probe: String,
    temperature: Option<Celsius>,
    active: bool,
}

sql_mapper::impl_record!(Sample { probe, temperature, active });

fn celsius_mapper() -> SqlMapper {
    let mut mapper = SqlMapper::new();
    mapper.mappings_mut().set::<Celsius>(
        Some(Box::new(|v: &RowValues| {
            v.as_text()
                .and_then(|s| s.strip_suffix('C'))
                .and_then(|s| s.parse().ok())
                .map(Celsius)
        })),
        Some(Box::new(|c: &Celsius| Some(RowValues::Text(format!("{}C", c.0))))),
    );
    mapper.mappings_mut().set::<bool>(
        Some(Box::new(|v: &RowValues| v.as_text().map(|s| s == "Y"))),
        Some(Box::new(|b: &bool| Some(RowValues::Text(if *b { "Y" } else { "N" }.into())))),
    );
    mapper
}

const DDL: &str = "CREATE TABLE samples (probe TEXT, temperature TEXT, active TEXT);";

#[test]
fn mappings_apply_in_both_directions() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db(DDL)?;
    let mapper = celsius_mapper();
    let sample = Sample {
        probe: "p1".into(),
        temperature: Some(Celsius(21.5)),
        active: true,
    };
    mapper.execute(
        &conn,
        "INSERT INTO samples VALUES (:probe, :temperature, :active)",
        &sample,
    )?;

    let raw = mapper.query_dynamic(&conn, "SELECT temperature, active FROM samples", ())?;
    assert_eq!(raw[0].get("temperature"), Some(&RowValues::Text("21.5C".into())));
    assert_eq!(raw[0].get("active"), Some(&RowValues::Text("Y".into())));

    let read: Vec<Sample> = mapper.query(&conn, "SELECT * FROM samples", ())?;
    assert_eq!(read, vec![sample]);
    Ok(())
}

#[test]
fn mapped_null_reads_as_none() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db(DDL)?;
    let mapper = celsius_mapper();
    mapper.execute(
        &conn,
        "INSERT INTO samples VALUES ('p2', 'not a temperature', 'N')",
        (),
    )?;
    let read: Option<Sample> = mapper.query_first(&conn, "SELECT * FROM samples", ())?;
    assert_eq!(
        read,
        Some(Sample {
            probe: "p2".into(),
            temperature: None,
            active: false,
        })
    );
    Ok(())
}

#[test]
fn without_a_mapping_custom_types_fail() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let err = SqlMapper::new()
        .query::<Sample, _>(&conn, "SELECT '3C' AS temperature", ())
        .unwrap_err();
    assert!(matches!(
        err,
        SqlMapperError::CoercionFault { ref dest_type, .. } if dest_type == "Option<Celsius>"
    ));
    Ok(())
}

#[test]
fn removing_a_direction_restores_builtin_rules() {
    let mut mapper = celsius_mapper();
    mapper.mappings_mut().set::<bool>(None, None);
    assert!(!mapper.mappings().has_outbound::<bool>());

    let bindings = mapper.bind(Params::new().add("active", true)).unwrap();
    assert_eq!(bindings[0].value, RowValues::Bool(true));
}

#[test]
fn mappers_do_not_share_overrides() {
    let custom = celsius_mapper();
    let plain = SqlMapper::new();
    let custom_binding = custom.bind(Params::new().add("t", Celsius(1.0))).unwrap();
    let plain_binding = plain.bind(Params::new().add("t", Celsius(1.0))).unwrap();
    assert_eq!(custom_binding[0].value, RowValues::Text("1C".into()));
    assert_eq!(plain_binding[0].value, RowValues::Float(1.0));
}
