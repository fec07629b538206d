//! Instruction blocks appended after the structured context.

use folio_core::ChapterSpec;

pub(crate) fn architecture() -> String {
    "Design the story architecture for this project. Cover the core premise and \
     central conflict, the principal characters with their goals, traits and \
     relationships, the world and its rules, and the major plot threads to be \
     opened and resolved over the book. Write plain prose with short headed parts."
        .to_string()
}

pub(crate) fn blueprint(num_chapters: u32) -> String {
    format!(
        "Plan the book as exactly {num_chapters} chapters grounded in the architecture. \
         Output ONLY valid JSON: an array of objects with keys \"index\" (1 to \
         {num_chapters}, in order), \"title\" and \"synopsis\" (one sentence)."
    )
}

pub(crate) fn outline(spec: &ChapterSpec) -> String {
    format!(
        "Outline chapter {} \"{}\" as a numbered list of scenes. Honour the established \
         characters, the open plot threads and the related passages. Do not write the \
         chapter itself.",
        spec.index, spec.title
    )
}

pub(crate) fn draft(spec: &ChapterSpec, words: u32) -> String {
    format!(
        "Write chapter {} \"{}\" in full, following the outline, in roughly {words} words. \
         Stay consistent with the established characters and the story so far. Output \
         only the chapter text.",
        spec.index, spec.title
    )
}

pub(crate) fn finalization(chapter: u32) -> String {
    format!(
        "Chapter {chapter} has been approved. Output ONLY valid JSON with keys:\n\
         \"summary\": a short paragraph summarising the chapter;\n\
         \"characters\": an object mapping each character who appears to \
         {{\"attributes\": {{name: value}}, \"arc_position\": string or null}};\n\
         \"new_threads\": descriptions of plot threads this chapter opens;\n\
         \"resolved_threads\": ids of open plot threads this chapter resolves."
    )
}

pub(crate) fn consistency() -> String {
    "Compare the chapter under review with the established characters, the open \
     plot threads and the related passages. Report only genuine contradictions. \
     Output ONLY valid JSON: {\"contradictions\": [{\"explanation\": string, \
     \"entity\": string or null}]}, with an empty list when there are none."
        .to_string()
}
