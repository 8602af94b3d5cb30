/// Asserts that a run has the grid and density lengths of a finished run.
#[macro_export]
macro_rules! assert_run_shape {
    ($run:expr, $end_time:expr, $cells:expr) => {
        let run = &$run;
        assert_eq!(
            run.grid.shape(),
            ($end_time, $cells),
            "lambda {} grid has the wrong shape",
            run.lambda
        );
        assert_eq!(
            run.density.len(),
            $end_time + 1,
            "lambda {} density series has the wrong length",
            run.lambda
        );
    };
}

/// Asserts that every stored cell is 0 or 1.
#[macro_export]
macro_rules! assert_binary_grid {
    ($run:expr) => {
        assert!(
            $run.grid.as_slice().iter().all(|&c| c <= 1),
            "lambda {} grid holds a non-binary cell",
            $run.lambda
        );
    };
}
