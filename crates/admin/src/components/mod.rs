//! Reusable view components.

pub mod data_table;

pub use data_table::{
    DataTableConfig, FilterOption, Pagination, TableColumn, TableFilter,
    advertisements_table_config, users_table_config,
};
