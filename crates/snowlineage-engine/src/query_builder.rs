//! Builds lineage traversal queries

use snowlineage_core::{
    Direction, LineageError, ObjectReference, ObjectType, QuerySpec, MAX_DISTANCE, MIN_DISTANCE,
};

/// Check that a traversal distance is within the accepted range
pub fn validate_distance(max_distance: u32) -> Result<(), LineageError> {
    if (MIN_DISTANCE..=MAX_DISTANCE).contains(&max_distance) {
        Ok(())
    } else {
        Err(LineageError::InvalidDistance {
            distance: max_distance,
            min: MIN_DISTANCE,
            max: MAX_DISTANCE,
        })
    }
}

/// Build the query for one direction of a resolved object
pub fn build_query(
    object: &ObjectReference,
    object_type: ObjectType,
    direction: Direction,
    max_distance: u32,
) -> Result<QuerySpec, LineageError> {
    validate_distance(max_distance)?;

    Ok(QuerySpec {
        object: object.clone(),
        object_type,
        direction,
        max_distance,
    })
}
