use pyo3::pymodule;

mod audio_engine;
mod messages;
mod orca_board;
mod sea_turtle;
mod session;

/// The Python module implemented in Rust.
#[pymodule]
mod keytoys_audio {
    #[pymodule_export]
    use super::orca_board::OrcaBoard;

    #[pymodule_export]
    use super::sea_turtle::SeaTurtle;

    #[pymodule_export]
    use super::messages::AudioMessage;
}
