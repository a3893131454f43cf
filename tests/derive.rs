mod common;

#[cfg(feature = "derive")]
mod inner {
    use super::common::Document;
    use gridformat::{CellType, UnstructuredMesh, Vtu, Writer, XmlOptions};

    #[derive(gridformat::Fields)]
    struct Flow {
        pressure: Vec<f64>,
        #[gridformat(rename = "U")]
        velocity: Vec<[f32; 3]>,
        #[gridformat(cell)]
        material: Vec<u8>,
        #[gridformat(skip)]
        #[allow(dead_code)]
        scratch: Vec<String>,
    }

    fn mesh() -> UnstructuredMesh {
        let mut mesh = UnstructuredMesh::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        mesh.add_cell(CellType::Triangle, vec![0, 1, 2]).unwrap();
        mesh
    }

    #[test]
    fn registers_all_members() {
        let mesh = mesh();
        let flow = Flow {
            pressure: vec![1.0, 2.0, 3.0],
            velocity: vec![[1.0, 0.0, 0.0]; 3],
            material: vec![7],
            scratch: Vec::new(),
        };

        let mut writer = Writer::new(Vtu, &mesh, XmlOptions::ascii()).unwrap();
        writer.set_fields(&flow).unwrap();

        let mut out = Vec::new();
        writer.write(&mut out).unwrap();
        let doc = Document::parse(&out);

        assert_eq!(doc.data_array("pressure").text.as_deref(), Some("1.0 2.0 3.0"));
        assert_eq!(doc.data_array("U").attribute("NumberOfComponents"), Some("3"));
        assert_eq!(doc.data_array("material").text.as_deref(), Some("7"));
        assert!(doc.all("DataArray").iter().all(|a| a.attribute("Name") != Some("scratch")));
    }

    #[test]
    fn wrong_lengths_are_reported() {
        let mesh = mesh();
        let flow = Flow {
            pressure: vec![1.0],
            velocity: vec![[0.0; 3]; 3],
            material: vec![7],
            scratch: Vec::new(),
        };

        let mut writer = Writer::new(Vtu, &mesh, XmlOptions::ascii()).unwrap();
        assert!(writer.set_fields(&flow).is_err());
    }
}
