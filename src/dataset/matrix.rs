use ndarray::{Array2, ArrayView1, Axis};

/// Row-major feature matrix with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.ncols());
        Self { columns, values }
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|idx| self.values.column(idx))
    }

    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(idx)
    }

    /// New matrix holding `rows` in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn selects_rows_in_order() {
        let matrix = FeatureMatrix::new(
            vec!["a".into(), "b".into()],
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
        );
        let picked = matrix.select_rows(&[2, 0]);
        assert_eq!(picked.values, array![[5.0, 6.0], [1.0, 2.0]]);
        assert_eq!(picked.column("b").unwrap().to_vec(), vec![6.0, 2.0]);
        assert!(matrix.column("c").is_none());
    }
}
