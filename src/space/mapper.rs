use crate::space::Mapper;

/// Each entity owns a contiguous block of `block_size` global indices.
///
/// Used by discontinuous spaces, where no degree of freedom is shared between entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMapper {
    num_entities: usize,
    block_size: usize,
}

impl BlockMapper {
    pub fn new(num_entities: usize, block_size: usize) -> Self {
        Self {
            num_entities,
            block_size,
        }
    }
}

impl Mapper for BlockMapper {
    fn size(&self) -> usize {
        self.num_entities * self.block_size
    }

    fn max_local_size(&self) -> usize {
        self.block_size
    }

    fn local_size(&self, _entity: usize) -> usize {
        self.block_size
    }

    fn global_index(&self, entity: usize, local_index: usize) -> usize {
        assert!(entity < self.num_entities, "Entity index out of bounds");
        assert!(local_index < self.block_size, "Local index out of bounds");
        self.block_size * entity + local_index
    }
}

/// One degree of freedom per grid vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexMapper {
    num_vertices: usize,
    vertices_per_entity: usize,
    entity_vertices: Vec<usize>,
}

impl VertexMapper {
    /// Creates a mapper from the flattened per-entity vertex lists.
    pub fn new(num_vertices: usize, vertices_per_entity: usize, entity_vertices: Vec<usize>) -> Self {
        assert!(vertices_per_entity > 0);
        assert_eq!(entity_vertices.len() % vertices_per_entity, 0);
        assert!(entity_vertices.iter().all(|&v| v < num_vertices), "Vertex index out of bounds");
        Self {
            num_vertices,
            vertices_per_entity,
            entity_vertices,
        }
    }
}

impl Mapper for VertexMapper {
    fn size(&self) -> usize {
        self.num_vertices
    }

    fn max_local_size(&self) -> usize {
        self.vertices_per_entity
    }

    fn local_size(&self, _entity: usize) -> usize {
        self.vertices_per_entity
    }

    fn global_index(&self, entity: usize, local_index: usize) -> usize {
        assert!(local_index < self.vertices_per_entity, "Local index out of bounds");
        self.entity_vertices[self.vertices_per_entity * entity + local_index]
    }

    fn populate_global_indices(&self, entity: usize, indices: &mut Vec<usize>) {
        let n = self.vertices_per_entity;
        indices.clear();
        indices.extend_from_slice(&self.entity_vertices[n * entity..n * (entity + 1)]);
    }
}
