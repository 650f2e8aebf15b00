//
// batch.rs
//
// Copyright (C) 2024 Posit Software, PBC. All rights reserved.
//
//

use std::sync::Arc;

use arrow::array::Array;
use arrow::array::ArrayRef;
use arrow::array::AsArray;
use arrow::array::BooleanArray;
use arrow::array::Date32Array;
use arrow::array::Float64Array;
use arrow::array::Int64Array;
use arrow::array::Scalar;
use arrow::array::StringArray;
use arrow::array::Time64NanosecondArray;
use arrow::array::TimestampMicrosecondArray;
use arrow::array::UInt64Array;
use arrow::compute::cast;
use arrow::compute::kernels::boolean::and;
use arrow::compute::kernels::boolean::is_null;
use arrow::compute::kernels::boolean::not;
use arrow::compute::kernels::boolean::or;
use arrow::compute::kernels::cmp;
use arrow::compute::kernels::nullif::nullif;
use arrow::compute::take;
use arrow::compute::SortOptions;
use arrow::csv::WriterBuilder;
use arrow::datatypes::DataType;
use arrow::datatypes::Date32Type;
use arrow::datatypes::Field;
use arrow::datatypes::Float64Type;
use arrow::datatypes::Int64Type;
use arrow::datatypes::Schema;
use arrow::datatypes::Time64NanosecondType;
use arrow::datatypes::TimeUnit;
use arrow::datatypes::TimestampMicrosecondType;
use arrow::record_batch::RecordBatch;
use arrow::record_batch::RecordBatchOptions;
use arrow::row::RowConverter;
use arrow::row::SortField;
use arrow::util::display::ArrayFormatter;
use arrow::util::display::FormatOptions as ArrowFormatOptions;
use chrono::NaiveDate;
use chrono::NaiveTime;
use chrono::Timelike;
use itertools::Itertools;
use relay::comm::data_explorer_comm::ColumnDisplayType;
use relay::comm::data_explorer_comm::ColumnSchema;
use relay::comm::data_explorer_comm::ColumnSortKey;
use relay::comm::data_explorer_comm::ExportFormat;
use relay::comm::data_explorer_comm::FilterComparisonOp;
use relay::comm::data_explorer_comm::RowFilter;
use relay::comm::data_explorer_comm::RowFilterType;

use crate::data_explorer::backend::Mask;
use crate::data_explorer::backend::TableAdapter;
use crate::data_explorer::coerce::coerce_value;
use crate::data_explorer::export_selection::delimiter;
use crate::data_explorer::export_selection::export_values;
use crate::data_explorer::export_selection::exported_text;
use crate::data_explorer::filter::between_params;
use crate::data_explorer::filter::comparison_params;
use crate::data_explorer::filter::evaluate_values;
use crate::data_explorer::sort::sort_rows_by_values;
use crate::data_explorer::utils::checked_column;
use crate::data_explorer::utils::TypeCache;
use crate::error::Error;
use crate::value::epoch;
use crate::value::Value;

/// Adapter over an Arrow `RecordBatch`.
///
/// Columns are normalised once, when the adapter is created: integers are
/// widened to `Int64`, other numbers become `Float64`, strings become
/// `Utf8` and temporal columns get a single unit per kind. The kernels
/// below only need to deal with those types. Type names reported in the
/// schema are the original ones.
pub struct ArrowAdapter {
    names: Vec<String>,
    type_names: Vec<String>,
    columns: Vec<ArrayRef>,
    num_rows: usize,
}

impl ArrowAdapter {
    pub fn new(batch: &RecordBatch) -> Self {
        let schema = batch.schema();

        let mut names = Vec::with_capacity(batch.num_columns());
        let mut type_names = Vec::with_capacity(batch.num_columns());
        let mut columns = Vec::with_capacity(batch.num_columns());

        for (field, column) in schema.fields().iter().zip(batch.columns()) {
            names.push(field.name().clone());
            type_names.push(arrow_type_name(field.data_type()));
            columns.push(normalise(field.name(), column));
        }

        Self {
            names,
            type_names,
            columns,
            num_rows: batch.num_rows(),
        }
    }

    fn array(&self, index: usize) -> crate::Result<&ArrayRef> {
        self.columns.get(index).ok_or(Error::InvalidColumnIndex {
            index: index as i64,
            num_columns: self.columns.len(),
        })
    }

    /// The column with NaN turned into nulls, so that kernels treat it as
    /// missing.
    fn comparable(&self, index: usize) -> crate::Result<ArrayRef> {
        let array = self.array(index)?;
        if array.data_type() != &DataType::Float64 {
            return Ok(array.clone());
        }

        let nan: BooleanArray = array
            .as_primitive::<Float64Type>()
            .iter()
            .map(|x| Some(x.is_some_and(f64::is_nan)))
            .collect();

        Ok(nullif(array.as_ref(), &nan)?)
    }

    fn take_rows(array: &ArrayRef, rows: Option<&[usize]>) -> crate::Result<ArrayRef> {
        match rows {
            Some(rows) => {
                let indices = UInt64Array::from_iter_values(rows.iter().map(|row| *row as u64));
                Ok(take(array.as_ref(), &indices, None)?)
            },
            None => Ok(array.clone()),
        }
    }

    fn sort_rows_by_values(&self, rows: &mut [usize], keys: &[(usize, bool)]) -> crate::Result<()> {
        let mut columns = Vec::with_capacity(keys.len());
        for (index, ascending) in keys {
            columns.push((self.column_values(*index, None)?, *ascending));
        }
        sort_rows_by_values(rows, &columns);
        Ok(())
    }
}

impl TableAdapter for ArrowAdapter {
    fn num_rows(&self) -> usize {
        self.num_rows
    }

    fn num_columns(&self) -> usize {
        self.columns.len()
    }

    fn column_name(&self, index: usize) -> Option<String> {
        self.names.get(index).cloned()
    }

    fn type_name(&self, index: usize) -> Option<String> {
        self.type_names.get(index).cloned()
    }

    fn schema_of(&self, index: usize, _cache: &mut TypeCache) -> crate::Result<ColumnSchema> {
        let array = self.array(index)?;

        let timezone = match array.data_type() {
            DataType::Timestamp(_, Some(tz)) => Some(tz.to_string()),
            _ => None,
        };

        Ok(ColumnSchema {
            column_name: self.names[index].clone(),
            column_index: index as i64,
            type_name: self.type_names[index].clone(),
            type_display: display_type(array.data_type()),
            description: None,
            timezone,
        })
    }

    fn column_values(&self, index: usize, rows: Option<&[usize]>) -> crate::Result<Vec<Value>> {
        let array = Self::take_rows(self.array(index)?, rows)?;
        Ok((0..array.len())
            .map(|row| arrow_value(array.as_ref(), row))
            .collect())
    }

    fn export_formats(&self) -> Vec<ExportFormat> {
        vec![ExportFormat::Csv, ExportFormat::Tsv]
    }

    /// Writes the taken columns with the Arrow CSV writer. Missing values,
    /// NaN included, are written as empty fields.
    fn export(
        &self,
        rows: &[usize],
        columns: &[usize],
        format: ExportFormat,
        include_header: bool,
    ) -> crate::Result<String> {
        if !self.export_formats().contains(&format) {
            return Err(Error::UnsupportedFeature(format!("{format} export")));
        }

        let mut fields = Vec::with_capacity(columns.len());
        let mut arrays = Vec::with_capacity(columns.len());
        for index in columns {
            let array = Self::take_rows(&self.comparable(*index)?, Some(rows))?;
            fields.push(Field::new(
                self.names[*index].clone(),
                array.data_type().clone(),
                true,
            ));
            arrays.push(array);
        }

        if fields.iter().any(|field| field.data_type().is_nested()) {
            log::trace!("Exporting row by row, the CSV writer can't write nested columns");
            return export_values(self, rows, columns, format, include_header);
        }

        let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
        let schema = Arc::new(Schema::new(fields));
        let batch = RecordBatch::try_new_with_options(schema, arrays, &options)?;

        let mut buffer = Vec::new();
        let mut writer = WriterBuilder::new()
            .with_header(include_header)
            .with_delimiter(delimiter(format))
            .with_date_format(String::from("%Y-%m-%d"))
            .with_timestamp_format(String::from("%Y-%m-%d %H:%M:%S"))
            .with_timestamp_tz_format(String::from("%Y-%m-%d %H:%M:%S%:z"))
            .with_time_format(String::from("%H:%M:%S"))
            .build(&mut buffer);
        writer.write(&batch)?;
        drop(writer);

        exported_text(buffer)
    }

    fn evaluate_filter(&self, filter: &RowFilter) -> crate::Result<Mask> {
        let index = checked_column(filter.column_schema.column_index, self.num_columns())?;
        let array = self.comparable(index)?;
        let data_type = array.data_type().clone();
        let display = display_type(&data_type);

        let mask = match filter.filter_type {
            RowFilterType::IsNull => is_null(array.as_ref())?,
            RowFilterType::NotNull => not(&is_null(array.as_ref())?)?,
            RowFilterType::IsTrue if data_type == DataType::Boolean => array.as_boolean().clone(),
            RowFilterType::IsFalse if data_type == DataType::Boolean => not(array.as_boolean())?,
            RowFilterType::IsEmpty | RowFilterType::NotEmpty if data_type == DataType::Utf8 => {
                let empty = Value::Str(String::new());
                let op = match filter.filter_type {
                    RowFilterType::IsEmpty => FilterComparisonOp::Eq,
                    _ => FilterComparisonOp::NotEq,
                };
                compare_kernel(&array, op, &empty)?
            },
            RowFilterType::Compare if is_vectorised(&data_type) => {
                let params = comparison_params(filter)?;
                let value = coerce_value(&params.value, display)?;
                compare_kernel(&array, params.op, &value)?
            },
            RowFilterType::Between | RowFilterType::NotBetween if is_vectorised(&data_type) => {
                let params = between_params(filter)?;
                let left = coerce_value(&params.left_value, display)?;
                let right = coerce_value(&params.right_value, display)?;

                match filter.filter_type {
                    RowFilterType::Between => and(
                        &compare_kernel(&array, FilterComparisonOp::GtEq, &left)?,
                        &compare_kernel(&array, FilterComparisonOp::LtEq, &right)?,
                    )?,
                    _ => or(
                        &compare_kernel(&array, FilterComparisonOp::Lt, &left)?,
                        &compare_kernel(&array, FilterComparisonOp::Gt, &right)?,
                    )?,
                }
            },
            _ => {
                let values = self.column_values(index, None)?;
                return evaluate_values(&values, filter);
            },
        };

        Ok(mask.iter().collect())
    }

    fn sort_rows(&self, rows: &mut [usize], keys: &[ColumnSortKey]) -> crate::Result<()> {
        let mut fields = Vec::with_capacity(keys.len());
        let mut columns = Vec::with_capacity(keys.len());
        let mut indices = Vec::with_capacity(keys.len());

        for key in keys {
            let index = checked_column(key.column_index, self.num_columns())?;
            let array = self.comparable(index)?;
            fields.push(SortField::new_with_options(
                array.data_type().clone(),
                SortOptions {
                    descending: !key.ascending,
                    nulls_first: false,
                },
            ));
            columns.push(array);
            indices.push((index, key.ascending));
        }

        if !RowConverter::supports_fields(&fields) {
            log::trace!("Sorting by values, the row format doesn't support these columns");
            return self.sort_rows_by_values(rows, &indices);
        }

        let converter = RowConverter::new(fields)?;
        let encoded = converter.convert_columns(&columns)?;
        rows.sort_by(|a, b| encoded.row(*a).cmp(&encoded.row(*b)));

        Ok(())
    }

    fn null_count(&self, index: usize, rows: Option<&[usize]>) -> crate::Result<i64> {
        let array = Self::take_rows(&self.comparable(index)?, rows)?;
        Ok(array.logical_null_count() as i64)
    }
}

fn normalised_type(data_type: &DataType) -> Option<DataType> {
    use DataType::*;

    match data_type {
        Int8 | Int16 | Int32 | UInt8 | UInt16 | UInt32 => Some(Int64),
        UInt64 | Float16 | Float32 | Decimal128(..) | Decimal256(..) => Some(Float64),
        LargeUtf8 | Utf8View => Some(Utf8),
        Dictionary(_, values) if matches!(values.as_ref(), Utf8 | LargeUtf8 | Utf8View) => Some(Utf8),
        Date64 => Some(Date32),
        Time32(_) | Time64(TimeUnit::Microsecond) => Some(Time64(TimeUnit::Nanosecond)),
        Timestamp(unit, tz) if *unit != TimeUnit::Microsecond => {
            Some(Timestamp(TimeUnit::Microsecond, tz.clone()))
        },
        _ => None,
    }
}

fn normalise(name: &str, column: &ArrayRef) -> ArrayRef {
    let Some(target) = normalised_type(column.data_type()) else {
        return column.clone();
    };

    match cast(column.as_ref(), &target) {
        Ok(array) => array,
        Err(err) => {
            log::warn!(
                "Can't convert column '{name}' from {} to {target}: {err}",
                column.data_type()
            );
            column.clone()
        },
    }
}

fn display_type(data_type: &DataType) -> ColumnDisplayType {
    match data_type {
        DataType::Boolean => ColumnDisplayType::Boolean,
        DataType::Int64 | DataType::Float64 => ColumnDisplayType::Number,
        DataType::Utf8 => ColumnDisplayType::String,
        DataType::Date32 => ColumnDisplayType::Date,
        DataType::Timestamp(..) => ColumnDisplayType::Datetime,
        DataType::Time64(_) => ColumnDisplayType::Time,
        DataType::List(_) | DataType::LargeList(_) | DataType::FixedSizeList(..) => {
            ColumnDisplayType::Array
        },
        DataType::Struct(_) => ColumnDisplayType::Struct,
        DataType::Null => ColumnDisplayType::Unknown,
        _ => ColumnDisplayType::Object,
    }
}

fn is_vectorised(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Boolean |
            DataType::Int64 |
            DataType::Float64 |
            DataType::Utf8 |
            DataType::Date32 |
            DataType::Timestamp(TimeUnit::Microsecond, _) |
            DataType::Time64(TimeUnit::Nanosecond)
    )
}

fn time_unit(unit: &TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Second => "s",
        TimeUnit::Millisecond => "ms",
        TimeUnit::Microsecond => "us",
        TimeUnit::Nanosecond => "ns",
    }
}

pub fn arrow_type_name(data_type: &DataType) -> String {
    match data_type {
        DataType::Null => String::from("null"),
        DataType::Boolean => String::from("bool"),
        DataType::Utf8 => String::from("utf8"),
        DataType::LargeUtf8 => String::from("large_utf8"),
        DataType::Utf8View => String::from("utf8_view"),
        DataType::Date32 => String::from("date32[day]"),
        DataType::Date64 => String::from("date64[ms]"),
        DataType::Time32(unit) => format!("time32[{}]", time_unit(unit)),
        DataType::Time64(unit) => format!("time64[{}]", time_unit(unit)),
        DataType::Timestamp(unit, None) => format!("timestamp[{}]", time_unit(unit)),
        DataType::Timestamp(unit, Some(tz)) => {
            format!("timestamp[{}, tz={tz}]", time_unit(unit))
        },
        DataType::List(field) => format!("list<{}>", arrow_type_name(field.data_type())),
        DataType::LargeList(field) => {
            format!("large_list<{}>", arrow_type_name(field.data_type()))
        },
        DataType::Struct(fields) => format!(
            "struct<{}>",
            fields
                .iter()
                .map(|field| format!("{}: {}", field.name(), arrow_type_name(field.data_type())))
                .join(", ")
        ),
        DataType::Dictionary(keys, values) => format!(
            "dictionary<values={}, indices={}>",
            arrow_type_name(values),
            arrow_type_name(keys)
        ),
        other => format!("{other:?}").to_lowercase(),
    }
}

/// Casts integer columns to float when compared against a fractional value.
fn compare_kernel(
    array: &ArrayRef,
    op: FilterComparisonOp,
    value: &Value,
) -> crate::Result<BooleanArray> {
    let lhs = match (array.data_type(), value) {
        (DataType::Int64, Value::Float(_)) => cast(array.as_ref(), &DataType::Float64)?,
        _ => array.clone(),
    };
    let rhs = Scalar::new(scalar_array(value, lhs.data_type())?);

    let result = match op {
        FilterComparisonOp::Eq => cmp::eq(&lhs, &rhs)?,
        FilterComparisonOp::NotEq => cmp::neq(&lhs, &rhs)?,
        FilterComparisonOp::Lt => cmp::lt(&lhs, &rhs)?,
        FilterComparisonOp::LtEq => cmp::lt_eq(&lhs, &rhs)?,
        FilterComparisonOp::Gt => cmp::gt(&lhs, &rhs)?,
        FilterComparisonOp::GtEq => cmp::gt_eq(&lhs, &rhs)?,
    };
    Ok(result)
}

/// A length-one array holding `value` with the column's exact type.
fn scalar_array(value: &Value, data_type: &DataType) -> crate::Result<ArrayRef> {
    let array: ArrayRef = match (value, data_type) {
        (Value::Bool(x), DataType::Boolean) => Arc::new(BooleanArray::from(vec![*x])),
        (Value::Int(x), DataType::Int64) => Arc::new(Int64Array::from(vec![*x])),
        (Value::Int(x), DataType::Float64) => Arc::new(Float64Array::from(vec![*x as f64])),
        (Value::Float(x), DataType::Float64) => Arc::new(Float64Array::from(vec![*x])),
        (Value::Str(x), DataType::Utf8) => Arc::new(StringArray::from(vec![x.as_str()])),
        (Value::Date(x), DataType::Date32) => Arc::new(Date32Array::from(vec![days(x)])),
        (Value::Datetime(x), DataType::Timestamp(_, tz)) => Arc::new(
            TimestampMicrosecondArray::from(vec![x.and_utc().timestamp_micros()])
                .with_timezone_opt(tz.clone()),
        ),
        (Value::Time(x), DataType::Time64(_)) => {
            Arc::new(Time64NanosecondArray::from(vec![nanoseconds(x)]))
        },
        (value, data_type) => {
            return Err(crate::anyhow!(
                "Can't compare a {data_type} column with '{value}'"
            ))
        },
    };
    Ok(array)
}

fn days(date: &NaiveDate) -> i32 {
    (*date - epoch().date()).num_days() as i32
}

fn nanoseconds(time: &NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * 1_000_000_000 + time.nanosecond() as i64
}

/// Reads one slot of a (normalised) array. Timestamps are read as UTC
/// wall clock time; the zone is reported in the schema.
fn arrow_value(array: &dyn Array, row: usize) -> Value {
    if array.is_null(row) {
        return Value::Null;
    }

    let value = match array.data_type() {
        DataType::Boolean => Some(Value::Bool(array.as_boolean().value(row))),
        DataType::Int64 => Some(Value::Int(array.as_primitive::<Int64Type>().value(row))),
        DataType::Float64 => Some(Value::Float(array.as_primitive::<Float64Type>().value(row))),
        DataType::Utf8 => Some(Value::Str(array.as_string::<i32>().value(row).to_string())),
        DataType::Date32 => array
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(Value::Date),
        DataType::Timestamp(TimeUnit::Microsecond, _) => array
            .as_primitive::<TimestampMicrosecondType>()
            .value_as_datetime(row)
            .map(Value::Datetime),
        DataType::Time64(TimeUnit::Nanosecond) => array
            .as_primitive::<Time64NanosecondType>()
            .value_as_time(row)
            .map(Value::Time),
        DataType::List(_) => Some(list_value(array.as_list::<i32>().value(row))),
        DataType::LargeList(_) => Some(list_value(array.as_list::<i64>().value(row))),
        DataType::FixedSizeList(..) => Some(list_value(array.as_fixed_size_list().value(row))),
        DataType::Struct(_) => {
            let array = array.as_struct();
            Some(Value::Struct(
                array
                    .column_names()
                    .iter()
                    .zip(array.columns())
                    .map(|(name, column)| (name.to_string(), arrow_value(column.as_ref(), row)))
                    .collect(),
            ))
        },
        _ => None,
    };

    value.unwrap_or_else(|| formatted_value(array, row))
}

fn list_value(items: ArrayRef) -> Value {
    Value::List(
        (0..items.len())
            .map(|i| arrow_value(items.as_ref(), i))
            .collect(),
    )
}

fn formatted_value(array: &dyn Array, row: usize) -> Value {
    let options = ArrowFormatOptions::default();
    match ArrayFormatter::try_new(array, &options) {
        Ok(formatter) => Value::Str(formatter.value(row).to_string()),
        Err(err) => {
            log::warn!("Can't format value of type {}: {err}", array.data_type());
            Value::Missing
        },
    }
}
