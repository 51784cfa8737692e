use crate::error::BookError;
use crate::models::ChapterSpec;
use crate::utils::strip_code_fences;

/// Decode the collaborator's answer to the outline-parsing prompt.
///
/// An empty array counts as a failure so a run never plans zero chapters.
pub fn decode_chapters(response: &str) -> Result<Vec<ChapterSpec>, BookError> {
    let json = strip_code_fences(response);
    let chapters: Vec<ChapterSpec> =
        serde_json::from_str(json).map_err(|e| BookError::OutlineParseFailed(e.to_string()))?;

    if chapters.is_empty() {
        return Err(BookError::OutlineParseFailed(
            "outline contained no chapters".to_string(),
        ));
    }
    Ok(chapters)
}

/// Fallback chapter plan, used whenever the outline is missing or unparseable.
pub fn default_chapters() -> Vec<ChapterSpec> {
    [
        (
            "Getting Started: Your First Pie Crust",
            "Introduction to Python basics, variables, and data types",
        ),
        (
            "Mixing the Ingredients: Working with Data",
            "Lists, dictionaries, and basic data manipulation",
        ),
        (
            "Following the Recipe: Control Flow",
            "If statements, loops, and program flow control",
        ),
        (
            "Custom Recipes: Functions",
            "Creating and using functions in Python",
        ),
        (
            "The Baker's Toolkit: Modules and Libraries",
            "Importing and using Python modules",
        ),
        (
            "Organizing Your Kitchen: File Handling",
            "Reading, writing, and managing files",
        ),
        (
            "Advanced Techniques: Object-Oriented Baking",
            "Classes, objects, and OOP concepts",
        ),
        (
            "Handling Kitchen Disasters: Error Management",
            "Exception handling and debugging",
        ),
        (
            "The Professional Kitchen: Best Practices",
            "Code style, documentation, and testing",
        ),
        (
            "Sharing Your Recipes: Final Projects",
            "Building complete applications and next steps",
        ),
    ]
    .into_iter()
    .map(|(title, description)| ChapterSpec::new(title, description))
    .collect()
}
