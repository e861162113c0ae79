#![cfg(feature = "sqlite")]

mod common;

use chrono::NaiveDateTime;
use sql_mapper::prelude::*;

#[test]
fn one_plus_one_is_a_single_int32() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let values: Vec<i32> = SqlMapper::new().query(&conn, "SELECT 1+1", ())?;
    assert_eq!(values, vec![2]);
    Ok(())
}

#[test]
fn scalar_reads_only_the_first_column() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let mapper = SqlMapper::new();
    let first: Option<String> = mapper.query_scalar(&conn, "SELECT 42, 'second'", ())?;
    assert_eq!(first.as_deref(), Some("42"));

    let none: Option<i64> = mapper.query_scalar(&conn, "SELECT 1 WHERE 0", ())?;
    assert_eq!(none, None);
    Ok(())
}

#[test]
fn matrix_truncates_like_a_cast() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let mapper = SqlMapper::new();

    let wide: Vec<u32> = mapper.query(&conn, "SELECT 2", ())?;
    assert_eq!(wide, vec![2]);

    let wrapped: Vec<u8> = mapper.query(&conn, "SELECT 258", ())?;
    assert_eq!(wrapped, vec![2]);

    let negative: Vec<u16> = mapper.query(&conn, "SELECT -1", ())?;
    assert_eq!(negative, vec![u16::MAX]);

    let truncated: Vec<i32> = mapper.query(&conn, "SELECT 2.9", ())?;
    assert_eq!(truncated, vec![2]);
    Ok(())
}

#[test]
fn boolean_rules_for_integers_and_floats() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let mapper = SqlMapper::new();
    let bools: Vec<bool> = mapper.query(
        &conn,
        "SELECT 0 UNION ALL SELECT 7 UNION ALL SELECT 0.5 UNION ALL SELECT 1.5 UNION ALL SELECT -0.5",
        (),
    )?;
    assert_eq!(bools, vec![false, true, false, true, false]);
    Ok(())
}

#[test]
fn rows_outside_the_matrix_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db("")?;
    let values: Vec<i64> = SqlMapper::new().query(
        &conn,
        "SELECT 1 UNION ALL SELECT 'two' UNION ALL SELECT NULL UNION ALL SELECT 4",
        (),
    )?;
    assert_eq!(values, vec![1, 4]);
    Ok(())
}

#[test]
fn every_matrix_source_reaches_every_destination() {
    let sources = [
        RowValues::Int32(2),
        RowValues::Int(2),
        RowValues::SmallInt(2),
        RowValues::TinyInt(2),
        RowValues::UTinyInt(2),
        RowValues::Float32(2.0),
        RowValues::Float(2.0),
    ];
    let rows: Vec<Vec<RowValues>> = sources.iter().cloned().map(|v| vec![v]).collect();
    let mapper = SqlMapper::new();

    macro_rules! check {
        ($($ty:ty => $want:expr),* $(,)?) => {
            $({
                let mut cursor = VecCursor::new(vec!["v".into()], rows.clone());
                let got: Vec<$ty> = mapper.map_rows(&mut cursor).unwrap();
                assert_eq!(got, vec![$want; sources.len()], "{}", stringify!($ty));
            })*
        };
    }

    check!(
        i32 => 2,
        u32 => 2,
        i64 => 2,
        u64 => 2,
        i16 => 2,
        u16 => 2,
        i8 => 2,
        u8 => 2,
        bool => true,
        f32 => 2.0,
        f64 => 2.0,
        char => '\u{2}',
    );
}

#[test]
fn dates_need_an_exact_type() -> Result<(), Box<dyn std::error::Error>> {
    let conn = common::memory_db(
        "CREATE TABLE events (at DATETIME);
         INSERT INTO events VALUES ('2024-01-02 03:04:05');",
    )?;
    let mapper = SqlMapper::new();

    let typed: Option<NaiveDateTime> = mapper.query_scalar(&conn, "SELECT at FROM events", ())?;
    assert_eq!(
        typed.map(|t| t.to_string()).as_deref(),
        Some("2024-01-02 03:04:05")
    );

    let untyped: Option<NaiveDateTime> =
        mapper.query_scalar(&conn, "SELECT '2024-01-02 03:04:05'", ())?;
    assert_eq!(untyped, None);
    Ok(())
}
