/// Describe a structured record's fields to the mapper.
///
/// Generates `FromRecord` and `FromRow` (columns are matched to the listed fields by normalized
/// name) and `ToParams` (each listed field becomes a parameter of the same name). The record must
/// implement `Default`; field types must implement `FromSql`, `ToParam` and `Clone`.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// #[derive(Debug, Default, Clone, PartialEq)]
/// struct Device {
///     device_id: i32,
///     name: String,
///     retired: Option<bool>,
/// }
///
/// sql_mapper::impl_record!(Device { device_id, name, retired });
///
/// let mut cursor = VecCursor::new(
///     vec!["DEVICE_ID".into(), "Name".into()],
///     vec![vec![RowValues::Int(1), RowValues::Text("probe".into())]],
/// );
/// let devices: Vec<Device> = SqlMapper::new().map_rows(&mut cursor).unwrap();
/// assert_eq!(devices[0].name, "probe");
/// assert_eq!(devices[0].retired, None);
/// ```
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::mapping::FromRecord for $ty {
            fn fields() -> ::std::vec::Vec<$crate::mapping::FieldSetter<Self>> {
                ::std::vec![
                    $($crate::mapping::FieldSetter::new(
                        ::std::stringify!($field),
                        |record: &mut Self, value| record.$field = value,
                    ),)*
                ]
            }
        }

        impl $crate::mapping::FromRow for $ty {
            type Plan = $crate::mapping::RecordPlan<Self>;

            fn plan(
                columns: &[::std::string::String],
            ) -> ::std::result::Result<Self::Plan, $crate::SqlMapperError> {
                ::std::result::Result::Ok($crate::mapping::RecordPlan::new(columns))
            }

            fn from_row(
                plan: &Self::Plan,
                row: &[$crate::RowValues],
                mappings: &$crate::TypeMappings,
            ) -> ::std::result::Result<::std::option::Option<Self>, $crate::SqlMapperError> {
                plan.map_row(row, mappings).map(::std::option::Option::Some)
            }
        }

        impl $crate::params::ToParams for $ty {
            fn to_params(&self) -> $crate::params::Params {
                $crate::params::Params::new()
                    $(.add(
                        ::std::stringify!($field),
                        ::std::clone::Clone::clone(&self.$field),
                    ))*
            }
        }
    };
}

/// Declare a fieldless enum stored as its integer discriminant.
///
/// The enum gets `SqlEnum`, `FromSql`, `FromScalar`, `FromRow` and `ToParam`. Parameters bind the
/// discriminant at the declared width; record fields accept either the discriminant or the exact
/// member name.
///
/// ```rust
/// use sql_mapper::prelude::*;
///
/// sql_mapper::sql_enum! {
///     pub enum Status: i16 {
///         Pending = 0,
///         Shipped = 3,
///     }
/// }
///
/// assert_eq!(Status::from_name("Shipped"), Some(Status::Shipped));
/// assert_eq!(Status::Shipped.discriminant(), 3);
/// assert_eq!(Status::enum_type().repr, ValueKind::I16);
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $repr:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),*
        }

        impl $name {
            /// Member names and discriminants in declaration order.
            pub const MEMBERS: &'static [(&'static str, i64)] =
                &[$((::std::stringify!($variant), $name::$variant as i64)),*];
        }

        impl $crate::types::SqlEnum for $name {
            fn enum_type() -> $crate::types::EnumType {
                $crate::types::EnumType {
                    name: ::std::stringify!($name),
                    repr: <$repr as $crate::types::EnumRepr>::KIND,
                    members: Self::MEMBERS,
                }
            }

            #[allow(clippy::cast_possible_wrap)]
            fn discriminant(self) -> i64 {
                self as i64
            }

            fn from_discriminant(discriminant: i64) -> ::std::option::Option<Self> {
                $(if discriminant == $name::$variant as i64 {
                    return ::std::option::Option::Some($name::$variant);
                })*
                ::std::option::Option::None
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => ::std::stringify!($variant)),*
                }
            }

            fn from_name(name: &str) -> ::std::option::Option<Self> {
                $(if name == ::std::stringify!($variant) {
                    return ::std::option::Option::Some($name::$variant);
                })*
                ::std::option::Option::None
            }
        }

        impl $crate::mapping::FromSql for $name {
            fn sql_type() -> $crate::types::SqlType {
                $crate::types::SqlType::Enum(<$name as $crate::types::SqlEnum>::enum_type())
            }

            fn from_value(value: $crate::RowValues) -> ::std::option::Option<Self> {
                value
                    .as_int()
                    .and_then(<$name as $crate::types::SqlEnum>::from_discriminant)
            }
        }

        impl $crate::mapping::FromScalar for $name {
            fn from_scalar(value: &$crate::RowValues) -> ::std::option::Option<Self> {
                $crate::coercion::coerce_enum_scalar(
                    value,
                    &<$name as $crate::types::SqlEnum>::enum_type(),
                )
                .and_then(|repr| repr.as_int())
                .and_then(<$name as $crate::types::SqlEnum>::from_discriminant)
            }
        }

        impl $crate::mapping::FromRow for $name {
            type Plan = ();

            fn plan(
                _columns: &[::std::string::String],
            ) -> ::std::result::Result<Self::Plan, $crate::SqlMapperError> {
                ::std::result::Result::Ok(())
            }

            fn from_row(
                _plan: &Self::Plan,
                row: &[$crate::RowValues],
                _mappings: &$crate::TypeMappings,
            ) -> ::std::result::Result<::std::option::Option<Self>, $crate::SqlMapperError> {
                ::std::result::Result::Ok($crate::mapping::scalar_from_row::<$name>(row))
            }
        }

        impl $crate::params::ToParam for $name {
            fn to_param(&self) -> $crate::params::ParamValue {
                let enum_type = <$name as $crate::types::SqlEnum>::enum_type();
                $crate::params::ParamValue::Enum(
                    enum_type.repr_value(<$name as $crate::types::SqlEnum>::discriminant(*self)),
                )
            }

            fn mapped(&self) -> ::std::option::Option<&dyn ::std::any::Any> {
                ::std::option::Option::Some(self)
            }
        }
    };
}
