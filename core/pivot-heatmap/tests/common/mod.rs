//! FILENAME: tests/common/mod.rs
//! Fixtures shared by the pivot integration tests.

#![allow(dead_code)]

use pivot_heatmap::Record;

/// Sales-style data: region, product, quarter, sales, quantity.
pub struct SalesFixture;

impl SalesFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Region", "Product", "Quarter", "Sales", "Quantity"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("East", "Apples", "Q1", 100.0, 10.0),
            ("East", "Apples", "Q2", 120.0, 12.0),
            ("East", "Oranges", "Q1", 80.0, 8.0),
            ("East", "Oranges", "Q2", 90.0, 9.0),
            ("North", "Apples", "Q1", 60.0, 6.0),
            ("North", "Pears", "Q2", 40.0, 4.0),
            ("West", "Apples", "Q1", 200.0, 20.0),
            ("West", "Apples", "Q1", 50.0, 5.0),
            ("West", "Oranges", "Q2", 70.0, 7.0),
            ("West", "Pears", "Q2", 30.0, 3.0),
        ]
    }

    pub fn records() -> Vec<Record> {
        let headers = Self::headers();
        Self::data()
            .into_iter()
            .map(|(region, product, quarter, sales, quantity)| {
                Record::new()
                    .with(headers[0], region)
                    .with(headers[1], product)
                    .with(headers[2], quarter)
                    .with(headers[3], sales)
                    .with(headers[4], quantity)
            })
            .collect()
    }
}

/// The three-record example: E/A=10, E/B=5, W/A=7.
pub fn small_records() -> Vec<Record> {
    vec![
        Record::new().with("region", "E").with("prod", "A").with("qty", 10),
        Record::new().with("region", "E").with("prod", "B").with("qty", 5),
        Record::new().with("region", "W").with("prod", "A").with("qty", 7),
    ]
}

/// Printable forms of a list of keys.
pub fn labels(keys: &[pivot_heatmap::CompositeKey]) -> Vec<String> {
    keys.iter().map(|k| k.display()).collect()
}
