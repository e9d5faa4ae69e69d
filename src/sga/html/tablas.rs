//! Extracción tolerante de tablas HTML.
//!
//! El SGA devuelve fragmentos generados a mano con `echo`, a veces con etiquetas
//! sin cerrar. `quick-xml` se usa sólo como tokenizador (sin verificar nombres de
//! cierre) y una pequeña máquina de estados arma las tablas: un `<td>` nuevo cierra
//! la celda anterior, un `<tr>` nuevo cierra la fila anterior y al final del
//! documento se cierra todo lo que quedó abierto.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Una celda ya limpia (entidades decodificadas, espacios colapsados).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Celda {
    pub texto: String,
    /// `true` si vino de un `<th>`.
    pub encabezado: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fila {
    pub celdas: Vec<Celda>,
}

impl Fila {
    pub fn tiene_encabezados(&self) -> bool {
        self.celdas.iter().any(|c| c.encabezado)
    }

    pub fn tiene_datos(&self) -> bool {
        self.celdas.iter().any(|c| !c.encabezado)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tabla {
    pub filas: Vec<Fila>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Table,
    Tr,
    Td,
    Th,
    Section,
    Break,
    Other,
}

fn tag_of(name: &[u8]) -> Tag {
    if name.eq_ignore_ascii_case(b"table") {
        Tag::Table
    } else if name.eq_ignore_ascii_case(b"tr") {
        Tag::Tr
    } else if name.eq_ignore_ascii_case(b"td") {
        Tag::Td
    } else if name.eq_ignore_ascii_case(b"th") {
        Tag::Th
    } else if name.eq_ignore_ascii_case(b"thead") || name.eq_ignore_ascii_case(b"tbody") || name.eq_ignore_ascii_case(b"tfoot") {
        Tag::Section
    } else if [&b"br"[..], b"p", b"div", b"li"].iter().any(|t| name.eq_ignore_ascii_case(t)) {
        Tag::Break
    } else {
        Tag::Other
    }
}

/// Tabla en construcción. `slot` es su posición en el orden del documento.
#[derive(Default)]
struct TablaAbierta {
    slot: usize,
    filas: Vec<Fila>,
    fila: Option<Vec<Celda>>,
    celda: Option<(String, bool)>,
}

impl TablaAbierta {
    fn cerrar_celda(&mut self) {
        if let Some((crudo, encabezado)) = self.celda.take() {
            let texto = normalize_ws(&decode_entities(&crudo));
            self.fila.get_or_insert_with(Vec::new).push(Celda { texto, encabezado });
        }
    }

    fn cerrar_fila(&mut self) {
        self.cerrar_celda();
        if let Some(celdas) = self.fila.take() {
            if !celdas.is_empty() {
                self.filas.push(Fila { celdas });
            }
        }
    }

    fn abrir_celda(&mut self, encabezado: bool) {
        self.cerrar_celda();
        if self.fila.is_none() {
            self.fila = Some(Vec::new());
        }
        self.celda = Some((String::new(), encabezado));
    }

    fn texto(&mut self, s: &str) {
        if let Some((crudo, _)) = self.celda.as_mut() {
            crudo.push_str(s);
        }
    }

    fn terminar(mut self) -> (usize, Tabla) {
        self.cerrar_fila();
        (self.slot, Tabla { filas: self.filas })
    }
}

/// Devuelve todas las tablas del documento en orden de aparición (de apertura).
///
/// Las tablas anidadas salen como tablas independientes; el texto de una celda
/// pertenece sólo a la tabla más interna que la contiene. Un error del tokenizador
/// no aborta: se conserva lo leído hasta ese punto.
pub fn extraer_tablas(html: &str) -> Vec<Tabla> {
    let mut reader = Reader::from_str(html);
    reader.check_end_names(false);
    reader.trim_text(false);

    let mut slots: Vec<Option<Tabla>> = Vec::new();
    let mut pila: Vec<TablaAbierta> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => abrir(tag_of(e.name().as_ref()), &mut pila, &mut slots),
            Ok(Event::Empty(e)) => {
                // <br/>, <td/> ...
                let tag = tag_of(e.name().as_ref());
                abrir(tag, &mut pila, &mut slots);
                cerrar(tag, &mut pila, &mut slots);
            }
            Ok(Event::End(e)) => cerrar(tag_of(e.name().as_ref()), &mut pila, &mut slots),
            Ok(Event::Text(e)) => {
                if let Some(top) = pila.last_mut() {
                    top.texto(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(top) = pila.last_mut() {
                    top.texto(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => {
                tracing::debug!(posicion = reader.buffer_position(), error = %err, "HTML mal formado, se conserva lo leído");
                break;
            }
        }
    }

    while let Some(abierta) = pila.pop() {
        let (slot, tabla) = abierta.terminar();
        slots[slot] = Some(tabla);
    }

    slots.into_iter().flatten().collect()
}

fn abrir(tag: Tag, pila: &mut Vec<TablaAbierta>, slots: &mut Vec<Option<Tabla>>) {
    match tag {
        Tag::Table => {
            slots.push(None);
            pila.push(TablaAbierta { slot: slots.len() - 1, ..Default::default() });
        }
        Tag::Tr | Tag::Section => {
            if let Some(top) = pila.last_mut() {
                top.cerrar_fila();
                if tag == Tag::Tr {
                    top.fila = Some(Vec::new());
                }
            }
        }
        Tag::Td | Tag::Th => {
            if let Some(top) = pila.last_mut() {
                top.abrir_celda(tag == Tag::Th);
            }
        }
        Tag::Break => {
            if let Some(top) = pila.last_mut() {
                top.texto(" ");
            }
        }
        Tag::Other => {}
    }
}

fn cerrar(tag: Tag, pila: &mut Vec<TablaAbierta>, slots: &mut [Option<Tabla>]) {
    match tag {
        Tag::Table => {
            if let Some(abierta) = pila.pop() {
                let (slot, tabla) = abierta.terminar();
                slots[slot] = Some(tabla);
            }
        }
        Tag::Tr | Tag::Section => {
            if let Some(top) = pila.last_mut() {
                top.cerrar_fila();
            }
        }
        Tag::Td | Tag::Th => {
            if let Some(top) = pila.last_mut() {
                top.cerrar_celda();
            }
        }
        Tag::Break => {
            if let Some(top) = pila.last_mut() {
                top.texto(" ");
            }
        }
        Tag::Other => {}
    }
}

/// Colapsa secuencias de espacios en uno solo y recorta.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodifica las entidades que aparecen en las páginas del SGA: `&nbsp;`, `&amp;`,
/// vocales acentuadas, `&ntilde;`, `&ordm;` y referencias numéricas. Las entidades
/// desconocidas se dejan tal cual.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after
            .find(';')
            .filter(|&semi| semi > 0 && semi <= 10)
            .and_then(|semi| entity(&after[..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        // &#160; también es un espacio duro
        return if code == 160 { Some(' ') } else { char::from_u32(code) };
    }

    let c = match name {
        "nbsp" => ' ',
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "aacute" => 'á',
        "eacute" => 'é',
        "iacute" => 'í',
        "oacute" => 'ó',
        "uacute" => 'ú',
        "Aacute" => 'Á',
        "Eacute" => 'É',
        "Iacute" => 'Í',
        "Oacute" => 'Ó',
        "Uacute" => 'Ú',
        "ntilde" => 'ñ',
        "Ntilde" => 'Ñ',
        "uuml" => 'ü',
        "Uuml" => 'Ü',
        "ordm" => 'º',
        "ordf" => 'ª',
        "deg" => '°',
        "iquest" => '¿',
        "iexcl" => '¡',
        _ => return None,
    };
    Some(c)
}
