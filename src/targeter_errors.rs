use thiserror::Error;

#[derive(Error, Debug)]
pub enum TargeterError {
    #[error(
        "Either an explicit system of solutions or a target radius is required \
         (a radius implies a spherical target)"
    )]
    MissingSolutionsAndRadius,

    #[error("Invalid target radius: {0} (must be finite and strictly positive)")]
    InvalidRadius(f64),

    #[error(
        "Unrecognized coordinates: a table must have columns 'x, y, z', \
         'dec_app_icrf, ra_app_icrf', 'dec, ra' or 'alt, az' (optionally with 'dist'), found: {0:?}"
    )]
    UnrecognizedCoordinates(Vec<String>),

    #[error("Only VECTORS and OBSERVER queries can be used as a basis for a Targeter, got: {0}")]
    UnsupportedQueryType(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column '{name}' has {found} rows, the table has {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("A grid needs one name per axis ({axes} axes, {names} names)")]
    GridAxisNames { axes: usize, names: usize },

    #[error("The body ephemeris must carry a time column")]
    MissingTime,

    #[error("Pointing and body ephemerides must have equal lengths (pointing: {pointing}, body: {body})")]
    RowCountMismatch { pointing: usize, body: usize },

    #[error("Pointings and target positions have mismatched time values (first mismatch at row {0})")]
    TimeMismatch(usize),

    #[error("find_target_grid() must be passed a table, not an ephemeris provider")]
    GridRequiresTable,

    #[error("Targets must be found with find_targets() or find_target_grid() before a reference shift")]
    NotTargeted,

    #[error("Expected {expected} epochs for {vectors} vectors, got {found}")]
    LengthMismatch {
        vectors: usize,
        expected: usize,
        found: usize,
    },

    #[error("Non-finite ephemeris time at row {0}")]
    NonFiniteTime(usize),

    #[error("Broadcast rotation spans {span_s} s, more than the configured tolerance of {tolerance_s} s")]
    BroadcastSpanExceeded { span_s: f64, tolerance_s: f64 },

    #[error("Unknown reference frame: {0}")]
    UnknownFrame(String),

    #[error("Rotation provider failure: {0}")]
    RotationProvider(Box<dyn std::error::Error + Send + Sync>),

    #[error("Invalid epoch: {0}")]
    InvalidEpoch(String),

    #[error("Invalid number in column '{column}': {value}")]
    InvalidNumber { column: String, value: String },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),
}

impl PartialEq for TargeterError {
    fn eq(&self, other: &Self) -> bool {
        use TargeterError::*;
        match (self, other) {
            (MissingSolutionsAndRadius, MissingSolutionsAndRadius) => true,
            (InvalidRadius(a), InvalidRadius(b)) => a.to_bits() == b.to_bits(),
            (UnrecognizedCoordinates(a), UnrecognizedCoordinates(b)) => a == b,
            (UnsupportedQueryType(a), UnsupportedQueryType(b)) => a == b,
            (MissingColumn(a), MissingColumn(b)) => a == b,
            (
                ColumnLength {
                    name: a,
                    expected: ea,
                    found: fa,
                },
                ColumnLength {
                    name: b,
                    expected: eb,
                    found: fb,
                },
            ) => a == b && ea == eb && fa == fb,
            (GridAxisNames { axes: a, names: na }, GridAxisNames { axes: b, names: nb }) => {
                a == b && na == nb
            }
            (MissingTime, MissingTime) => true,
            (
                RowCountMismatch {
                    pointing: pa,
                    body: ba,
                },
                RowCountMismatch {
                    pointing: pb,
                    body: bb,
                },
            ) => pa == pb && ba == bb,
            (TimeMismatch(a), TimeMismatch(b)) => a == b,
            (GridRequiresTable, GridRequiresTable) => true,
            (NotTargeted, NotTargeted) => true,
            (
                LengthMismatch {
                    vectors: va,
                    expected: ea,
                    found: fa,
                },
                LengthMismatch {
                    vectors: vb,
                    expected: eb,
                    found: fb,
                },
            ) => va == vb && ea == eb && fa == fb,
            (NonFiniteTime(a), NonFiniteTime(b)) => a == b,
            (BroadcastSpanExceeded { .. }, BroadcastSpanExceeded { .. }) => true,
            (UnknownFrame(a), UnknownFrame(b)) => a == b,
            (InvalidEpoch(a), InvalidEpoch(b)) => a == b,
            (
                InvalidNumber {
                    column: ca,
                    value: va,
                },
                InvalidNumber {
                    column: cb,
                    value: vb,
                },
            ) => ca == cb && va == vb,

            // Wrapped foreign errors are not comparable: equal if same variant
            (RotationProvider(_), RotationProvider(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
