#![cfg(feature = "sqlite")]

mod common;

use sql_mapper::prelude::*;

sql_mapper::sql_enum! {
    #[derive(Default)]
    enum Status: i16 {
        #[default]
        Pending = 0,
        Shipped = 3,
        Returned = 9,
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Order {
    id: i64,
    status: Status,
    previous: Option<Status>,
}

sql_mapper::impl_record!(Order { id, status, previous });

const DDL: &str = "CREATE TABLE orders (id INTEGER, status, previous);";

#[test]
fn integer_form_round_trips_through_both_paths() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db(DDL)?;
    let mapper = SqlMapper::new();
    let order = Order {
        id: 1,
        status: Status::Shipped,
        previous: Some(Status::Pending),
    };
    mapper.execute(
        &conn,
        "INSERT INTO orders VALUES (:id, :status, :previous)",
        &order,
    )?;

    let stored: Option<i64> = mapper.query_scalar(&conn, "SELECT status FROM orders", ())?;
    assert_eq!(stored, Some(3));

    let scalar: Vec<Status> = mapper.query(&conn, "SELECT status FROM orders", ())?;
    assert_eq!(scalar, vec![Status::Shipped]);

    let records: Vec<Order> = mapper.query(&conn, "SELECT * FROM orders", ())?;
    assert_eq!(records, vec![order]);
    Ok(())
}

#[test]
fn string_form_round_trips_through_records() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db(DDL)?;
    let mapper = SqlMapper::new();
    mapper.execute(
        &conn,
        "INSERT INTO orders VALUES (:id, :status, :previous)",
        Params::new()
            .add("id", 2_i64)
            .add("status", Status::Returned.name().to_string())
            .add("previous", None::<String>),
    )?;

    let records: Vec<Order> = mapper.query(&conn, "SELECT * FROM orders", ())?;
    assert_eq!(
        records,
        vec![Order {
            id: 2,
            status: Status::Returned,
            previous: None,
        }]
    );
    Ok(())
}

#[test]
fn member_names_are_case_sensitive() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let err = SqlMapper::new()
        .query::<Order, _>(&conn, "SELECT 1 AS id, 'shipped' AS status", ())
        .unwrap_err();
    match err {
        SqlMapperError::EnumParse {
            enum_name,
            value,
            field,
            ..
        } => {
            assert_eq!(enum_name, "Status");
            assert_eq!(value, "shipped");
            assert_eq!(field, "status");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn undefined_discriminants_differ_by_path() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let mapper = SqlMapper::new();

    let scalar: Vec<Status> = mapper.query(&conn, "SELECT 4 UNION ALL SELECT 9", ())?;
    assert_eq!(scalar, vec![Status::Returned]);

    let err = mapper
        .query::<Order, _>(&conn, "SELECT 1 AS id, 4 AS status", ())
        .unwrap_err();
    assert!(matches!(err, SqlMapperError::CoercionFault { ref field, .. } if field == "status"));
    Ok(())
}

#[test]
fn enums_bind_at_their_declared_width() {
    let bindings = SqlMapper::new()
        .bind(Params::new().add("s", Status::Shipped))
        .unwrap();
    assert_eq!(bindings[0].value, RowValues::SmallInt(3));
}
