use std::fs;
use std::path::Path;

use crate::config::ConfigError;

/// Diagnostic persona sent as the system message of every request.
pub const DEFAULT_PERSONA: &str = concat!(
    "Você é um especialista em diagnósticos médicos. Baseado nos sintomas apresentados pelo usuário, ",
    "personalize um possível diagnóstico. Sugira ao paciente que ele responda todas as perguntas sem exceção. ",
    "Não dê a resposta enquanto ele não responder todas as perguntas. Após ele responder as 10 perguntas, ",
    "você pode dar o diagnóstico e recomendar possíveis exames que um médico pediria. ",
    "Se ele perguntar os sintomas de alguma doença, dê a ele a resposta imediata nesse caso, não faça perguntas. ",
    "Receite alguns remédios básicos que não precisam ser orientados por um profissional e também recomende alguns exames. ",
    "Coloque todas as doenças relacionadas possíveis. Faça sempre 10 perguntas muito úteis, nem menos nem mais que isso. ",
    "Faça 1 pergunta de cada vez. Quando estiver acabando as perguntas, avise o paciente. ",
    "Só não faça pergunta se ele fizer uma pergunta sobre os sintomas de alguma doença, nesse caso, dê a ele uma resposta imediata. ",
    "Se o usuario dizer que levou tiro ou golpe de faca oriente-o a ligar ao 190 e pedir ajuda imediata."
);

/// Reads a persona override, falling back to [`DEFAULT_PERSONA`].
pub fn load_persona(path: Option<&Path>) -> Result<String, ConfigError> {
    let Some(path) = path else {
        return Ok(DEFAULT_PERSONA.to_string());
    };

    let text = fs::read_to_string(path).map_err(|source| ConfigError::Persona {
        path: path.to_path_buf(),
        source,
    })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ConfigError::EmptyPersona(path.to_path_buf()));
    }

    Ok(text.to_string())
}
